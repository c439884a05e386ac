//! Parallel assembly search
//!
//! A small fixed pool of worker threads races to assemble the map, each on
//! its own deep copy of the state with an independently seeded generator.
//! The first worker to finish claims an atomic flag and hands its state
//! back; the others notice the claim at their next checkpoint and abandon
//! quietly. If nobody finishes within the timeout the orchestrator claims
//! the flag itself, collects the workers, doubles the timeout and restarts
//! them from fresh copies — partial progress cannot safely be merged.
//!
//! The claim flag doubles as the cancellation token: it is checked at
//! exactly one point inside a worker's search loop, never during the
//! recursive gap search, so a losing worker may run its local search to
//! completion before it notices.

use crate::assembly::required::place_required_tiles;
use crate::assembly::state::AssemblyState;
use crate::io::configuration::{ASSEMBLE_THREADS, INITIAL_SEARCH_TIMEOUT_MS};
use crate::io::error::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What the winning worker hands back to the orchestrator
struct WorkerOutcome {
    state: AssemblyState,
    result: Result<bool>,
}

/// Shared coordination between the orchestrator and its workers
///
/// `claimed` is the single-permit gate: the first finisher flips it and
/// only that worker may post an outcome. The mutex/condvar pair exists
/// purely for the handoff and carries no search data.
struct RaceGate {
    claimed: AtomicBool,
    outcome: Mutex<Option<WorkerOutcome>>,
    finished: Condvar,
}

impl RaceGate {
    fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            outcome: Mutex::new(None),
            finished: Condvar::new(),
        }
    }
}

/// Seed a worker from the wall clock so parallel searches diverge
fn clock_seed(worker: usize) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    nanos ^ ((worker as u64 + 1) << 32)
}

fn spawn_workers(
    state: &AssemblyState,
    gate: &Arc<RaceGate>,
    count: usize,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            let mut local = state.clone();
            let gate = Arc::clone(gate);
            let seed = clock_seed(worker);
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let result = place_required_tiles(&mut local, &mut rng, Some(&gate.claimed));
                if matches!(result, Ok(false)) {
                    local.retry_cnt += 1;
                }

                // first past the post takes the claim; everyone else leaves
                if gate
                    .claimed
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return;
                }
                if let Ok(mut outcome) = gate.outcome.lock() {
                    *outcome = Some(WorkerOutcome {
                        state: local,
                        result,
                    });
                    gate.finished.notify_one();
                }
            })
        })
        .collect()
}

/// Race worker threads to assemble the map; the first finisher wins
///
/// On success the winning worker's state replaces `state`. The timeout
/// starts at five seconds and doubles on every restart.
///
/// # Errors
///
/// Propagates the winning worker's fatal error when the assembly has no
/// valid tiling.
pub fn parallel_search(state: &mut AssemblyState, thread_count: usize) -> Result<bool> {
    let workers = thread_count.clamp(1, ASSEMBLE_THREADS);
    let gate = Arc::new(RaceGate::new());
    let mut timeout = Duration::from_millis(INITIAL_SEARCH_TIMEOUT_MS);

    let mut handles = spawn_workers(state, &gate, workers);

    let outcome = loop {
        let Ok(mut guard) = gate.outcome.lock() else {
            // a worker panicked while posting; treat the search as dead
            break None;
        };
        let mut finished = None;
        loop {
            if let Some(result) = guard.take() {
                finished = Some(result);
                break;
            }
            let Ok((next, wait)) = gate.finished.wait_timeout(guard, timeout) else {
                break;
            };
            guard = next;
            if guard.is_some() {
                continue;
            }
            if !wait.timed_out() {
                // spurious wakeup
                continue;
            }

            // Timed out. Try to take the claim ourselves: if a worker
            // snatched it between the timeout and this attempt, it is about
            // to post, so just keep waiting.
            if gate
                .claimed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }

            log::warn!(
                "parallel assembly timed out after {} ms, restarting",
                timeout.as_millis()
            );
            timeout *= 2;

            drop(guard);
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
            gate.claimed.store(false, Ordering::Release);
            handles = spawn_workers(state, &gate, workers);

            let Ok(reacquired) = gate.outcome.lock() else {
                return finish(state, handles, None);
            };
            guard = reacquired;
        }
        if finished.is_some() {
            break finished;
        }
    };

    finish(state, handles, outcome)
}

/// Join the remaining workers and install the winning outcome
fn finish(
    state: &mut AssemblyState,
    handles: Vec<JoinHandle<()>>,
    outcome: Option<WorkerOutcome>,
) -> Result<bool> {
    for handle in handles {
        let _ = handle.join();
    }
    match outcome {
        Some(winner) => {
            *state = winner.state;
            winner.result
        }
        // only reachable when every worker died without posting
        None => Ok(false),
    }
}
