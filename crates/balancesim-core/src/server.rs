//! Simulated single-capacity servers with FIFO wait queues.
//!
//! Each [`ServerResource`] admits one occupant at a time. Everything else
//! waits in arrival order. The resource itself never refuses a request;
//! keeping queues under their bound is the balancer's job.

use crate::request::{Occupant, Request};
use balancesim_policies::ServerSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Identity of a server in the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServerId {
    /// Ordinary server at this position in the pool.
    Pool(u32),
    /// The overflow server.
    Emergency,
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerId::Pool(index) => write!(f, "server-{}", index),
            ServerId::Emergency => write!(f, "emergency"),
        }
    }
}

/// Outcome of [`ServerResource::request_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The slot was free and now belongs to the request.
    Granted { occupation_ticks: u64 },
    /// The request waits at this zero-based queue position.
    Queued { position: usize },
}

/// Result of releasing a server.
#[derive(Debug, Clone)]
pub struct Release {
    /// The request that just finished.
    pub finished: Occupant,
    /// The queue head that was handed the slot, if anyone was waiting.
    pub next: Option<u64>,
}

/// A simulated server that processes one request at a time.
#[derive(Debug, Clone)]
pub struct ServerResource {
    /// Server identity.
    pub id: ServerId,
    /// Speed multiplier dividing nominal service durations.
    pub speed: f64,
    /// Requests waiting for the slot, in arrival order.
    wait_queue: VecDeque<Request>,
    /// Request holding the slot.
    occupant: Option<Occupant>,
    // --- Counters ---
    /// Requests that finished service here.
    pub served: u64,
    /// Longest wait queue observed.
    pub peak_queue_length: usize,
}

impl ServerResource {
    pub fn new(id: ServerId, speed: f64) -> Self {
        debug_assert!(speed > 0.0, "server speed must be positive");
        Self {
            id,
            speed,
            wait_queue: VecDeque::new(),
            occupant: None,
            served: 0,
            peak_queue_length: 0,
        }
    }

    /// Claim the slot if it is free, otherwise join the back of the queue.
    pub fn request_access(&mut self, request: Request, now_ticks: u64) -> Access {
        if self.occupant.is_none() {
            let occupation_ticks = request.occupation_ticks(self.speed);
            self.occupant = Some(Occupant {
                request,
                started_ticks: now_ticks,
                occupation_ticks,
            });
            return Access::Granted { occupation_ticks };
        }

        self.wait_queue.push_back(request);
        self.peak_queue_length = self.peak_queue_length.max(self.wait_queue.len());
        Access::Queued {
            position: self.wait_queue.len() - 1,
        }
    }

    /// Free the slot held by `request_id` and hand it to the queue head.
    ///
    /// # Panics
    ///
    /// Panics if `request_id` does not hold the slot.
    pub fn release(&mut self, request_id: u64, now_ticks: u64) -> Release {
        let finished = match self.occupant.take() {
            Some(occupant) if occupant.request.id == request_id => occupant,
            other => panic!(
                "{} released by request {} but held by {:?}",
                self.id,
                request_id,
                other.map(|o| o.request.id)
            ),
        };
        self.served += 1;

        let next = self.wait_queue.pop_front().map(|request| {
            let id = request.id;
            self.occupant = Some(Occupant {
                occupation_ticks: request.occupation_ticks(self.speed),
                started_ticks: now_ticks,
                request,
            });
            id
        });

        Release { finished, next }
    }

    /// Current wait-queue length. The occupant is not counted.
    pub fn queue_length(&self) -> usize {
        self.wait_queue.len()
    }

    /// Whether a request currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    /// Requests waiting or in service.
    pub fn in_flight(&self) -> usize {
        self.wait_queue.len() + usize::from(self.occupant.is_some())
    }

    /// Sum of the nominal durations of waiting requests.
    pub fn queued_work(&self) -> f64 {
        self.wait_queue.iter().map(|r| r.service_duration).sum()
    }

    /// Create a read-only snapshot for balancing policies.
    pub fn snapshot(&self, index: u32, now_ticks: u64) -> ServerSnapshot {
        let (occupant_work, occupant_remaining_work) = match &self.occupant {
            Some(o) => (o.request.service_duration, o.remaining_work(now_ticks)),
            None => (0.0, 0.0),
        };
        ServerSnapshot {
            index,
            queue_length: self.wait_queue.len() as u32,
            speed: self.speed,
            busy: self.occupant.is_some(),
            queued_work: self.queued_work(),
            occupant_work,
            occupant_remaining_work,
        }
    }
}

/// The ordinary servers plus the optional emergency server.
#[derive(Debug, Clone)]
pub struct ServerPool {
    ordinary: Vec<ServerResource>,
    emergency: Option<ServerResource>,
}

impl ServerPool {
    /// Build a pool with one ordinary server per speed entry.
    pub fn new(speeds: &[f64], emergency_speed: Option<f64>) -> Self {
        let ordinary = speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| ServerResource::new(ServerId::Pool(i as u32), speed))
            .collect();
        Self {
            ordinary,
            emergency: emergency_speed.map(|speed| ServerResource::new(ServerId::Emergency, speed)),
        }
    }

    pub fn ordinary(&self) -> &[ServerResource] {
        &self.ordinary
    }

    pub fn emergency(&self) -> Option<&ServerResource> {
        self.emergency.as_ref()
    }

    pub fn get(&self, id: ServerId) -> Option<&ServerResource> {
        match id {
            ServerId::Pool(index) => self.ordinary.get(index as usize),
            ServerId::Emergency => self.emergency.as_ref(),
        }
    }

    /// Every server, ordinary ones first in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ServerResource> {
        self.ordinary.iter().chain(self.emergency.iter())
    }

    /// Snapshots of the ordinary servers in index order.
    pub fn snapshots(&self, now_ticks: u64) -> Vec<ServerSnapshot> {
        self.ordinary
            .iter()
            .enumerate()
            .map(|(i, s)| s.snapshot(i as u32, now_ticks))
            .collect()
    }

    /// Requests waiting or in service across the facility.
    pub fn in_flight(&self) -> u64 {
        self.iter().map(|s| s.in_flight() as u64).sum()
    }
}

impl Index<ServerId> for ServerPool {
    type Output = ServerResource;

    fn index(&self, id: ServerId) -> &ServerResource {
        match self.get(id) {
            Some(server) => server,
            None => panic!("no such server: {}", id),
        }
    }
}

impl IndexMut<ServerId> for ServerPool {
    fn index_mut(&mut self, id: ServerId) -> &mut ServerResource {
        match id {
            ServerId::Pool(index) => &mut self.ordinary[index as usize],
            ServerId::Emergency => match self.emergency.as_mut() {
                Some(server) => server,
                None => panic!("no emergency server configured"),
            },
        }
    }
}
