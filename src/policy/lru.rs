use super::EvictionPolicy;

/// Exact least-recently-used. Every filled slot carries an age counter;
/// an access ages all filled slots by one step and resets the accessed
/// slot, so the victim is the slot with the greatest age.
pub struct Lru {
    ages: Vec<Option<u64>>,
}

impl Lru {
    pub fn new(slots: usize) -> Self {
        Lru {
            ages: vec![None; slots],
        }
    }
}

impl EvictionPolicy for Lru {
    fn record_access(&mut self, slot: usize) {
        for age in self.ages.iter_mut().flatten() {
            *age += 1;
        }
        self.ages[slot] = Some(0);
    }

    fn choose_victim(&mut self) -> usize {
        let mut victim = None;
        for (slot, age) in self.ages.iter().enumerate() {
            if let Some(age) = *age {
                let older = match victim {
                    None => true,
                    Some((_, best)) => age > best,
                };
                if older {
                    victim = Some((slot, age));
                }
            }
        }
        let (slot, _) = victim.unwrap_or((0, 0));
        self.ages[slot] = None;
        slot
    }

    fn release(&mut self, slot: usize) {
        self.ages[slot] = None;
    }
}
