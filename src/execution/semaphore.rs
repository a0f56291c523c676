use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding how many years are normalized at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// Held while a year is in flight; the permit returns on drop.
pub struct Permit<'a> {
    sem: &'a Semaphore,
    /// Time spent blocked before the permit was granted.
    pub waited: Duration,
}

impl Semaphore {
    /// `permits` is clamped to at least one.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits.max(1)),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        // The guarded value is a plain counter; a poisoned lock still holds a valid count.
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire one permit, blocking until available.
    pub fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut waited = false;
        let mut g = self.lock();
        while *g == 0 {
            waited = true;
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        Permit {
            sem: self,
            waited: if waited { start.elapsed() } else { Duration::ZERO },
        }
    }

    fn release(&self) {
        *self.lock() += 1;
        self.cv.notify_one();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permits_return_on_drop() {
        let sem = Semaphore::new(1);
        {
            let p = sem.acquire();
            assert_eq!(p.waited, Duration::ZERO);
            assert_eq!(*sem.lock(), 0);
        }
        assert_eq!(*sem.lock(), 1);
    }

    #[test]
    fn zero_permits_is_clamped() {
        let sem = Semaphore::new(0);
        let _p = sem.acquire();
    }
}
