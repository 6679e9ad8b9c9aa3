// Session membership: the broadcast roster and the match seat table.
//
// `Roster` is copy-on-write. Joins and leaves (connection threads) clone the
// member list, modify the clone and swap it in; broadcasts (match worker and
// connection threads alike) take an `Arc` snapshot and iterate it without
// holding the lock, so a slow `send` never blocks a join.
//
// `SeatTable` is built once when the match starts and never renumbered: seat
// index == player index == turn slot == `ClientInfo::player_id`. Departures
// only flip the seat's `vacated` flag. The match worker sets `finished` when
// the seat's player brings the last pawn home, so departures can tell a
// finished player from one abandoning the match.

use std::ops::Index;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use halma_protocol::{ClientId, ClientInfo, Response};

use crate::participant::ClientSession;

pub type Member = Arc<dyn ClientSession>;

#[derive(Default)]
pub struct Roster {
    members: Mutex<Arc<Vec<Member>>>,
}

impl Roster {
    fn lock(&self) -> MutexGuard<'_, Arc<Vec<Member>>> {
        self.members.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Arc<Vec<Member>> {
        Arc::clone(&self.lock())
    }

    pub fn push(&self, member: Member) {
        let mut guard = self.lock();
        let mut next = Vec::clone(&guard);
        next.push(member);
        *guard = Arc::new(next);
    }

    pub fn remove(&self, id: ClientId) -> Option<Member> {
        let mut guard = self.lock();
        let index = guard.iter().position(|m| m.id() == id)?;
        let mut next = Vec::clone(&guard);
        let removed = next.remove(index);
        *guard = Arc::new(next);
        Some(removed)
    }

    /// Whether anyone other than a bot is still here.
    pub fn has_humans(&self) -> bool {
        self.snapshot().iter().any(|m| !m.is_bot())
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.snapshot().iter().any(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn broadcast(&self, response: &Response) {
        for member in self.snapshot().iter() {
            member.send(response.clone());
        }
    }
}

pub struct Seat {
    pub client: Member,
    /// The participant's info with `player_id` set to the seat index.
    pub info: ClientInfo,
    vacated: AtomicBool,
    finished: AtomicBool,
}

impl Seat {
    pub fn has_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_vacated(&self) -> bool {
        self.vacated.load(Ordering::SeqCst)
    }

    pub fn vacate(&self) {
        self.vacated.store(true, Ordering::SeqCst);
    }
}

pub struct SeatTable {
    seats: Vec<Seat>,
}

impl SeatTable {
    /// Seat `members` in order.
    pub fn new(members: &[Member]) -> Self {
        let seats = members
            .iter()
            .enumerate()
            .map(|(index, client)| {
                let mut info = client.info();
                info.player_id = Some(index);
                Seat {
                    client: Arc::clone(client),
                    info,
                    vacated: AtomicBool::new(false),
                    finished: AtomicBool::new(false),
                }
            })
            .collect();
        Self { seats }
    }

    pub fn get(&self, seat: usize) -> Option<&Seat> {
        self.seats.get(seat)
    }

    pub fn seat_of(&self, id: ClientId) -> Option<usize> {
        self.seats.iter().position(|s| s.client.id() == id)
    }

    pub fn infos(&self) -> Vec<ClientInfo> {
        self.seats.iter().map(|s| s.info.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }
}

/// Seat indices handed out by the table itself are always in range.
impl Index<usize> for SeatTable {
    type Output = Seat;

    fn index(&self, seat: usize) -> &Seat {
        &self.seats[seat]
    }
}
