//! Reserved-allocation sub-ledger.
//!
//! Tracks an ordered list of destinations, each holding a flat token amount
//! plus a percentage of total sales. Removal swaps the entry with the tail, so
//! list order is not preserved across removals. Distribution drains entries
//! from the tail of the list.
//!
//! The book is loaded through a [`StorageReader`], edited in memory and
//! persisted into an [`EffectSet`]; only changed slots are written.

use rexec_primitives::{Address, Word};

use crate::effects::EffectSet;
use crate::exception::{ensure, reasons, ApplicationException};
use crate::keys::KeyBuilder;
use crate::reader::StorageReader;

/// Most destinations one call may add or update.
pub const MAX_DESTINATIONS_PER_CALL: usize = 20;

/// Where a book lives in an instance's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationLayout {
    base: KeyBuilder,
}

impl ReservationLayout {
    pub fn new(label: &str) -> Self {
        Self {
            base: KeyBuilder::new(label),
        }
    }

    /// Slot holding the list length.
    pub fn list(&self) -> Word {
        self.base.label("destinations").build()
    }

    pub fn list_item(&self, index: u64) -> Word {
        self.base.label("destinations").index(index).build()
    }

    /// 1-based list position; zero when absent.
    pub fn list_index(&self, destination: Address) -> Word {
        self.entry(destination).label("index").build()
    }

    pub fn tokens(&self, destination: Address) -> Word {
        self.entry(destination).label("tokens").build()
    }

    pub fn percent(&self, destination: Address) -> Word {
        self.entry(destination).label("percent").build()
    }

    pub fn precision(&self, destination: Address) -> Word {
        self.entry(destination).label("precision").build()
    }

    fn entry(&self, destination: Address) -> KeyBuilder {
        self.base.label("entry").address(destination)
    }
}

/// One destination's allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub destination: Address,
    /// Flat amount granted regardless of sales.
    pub tokens: u128,
    /// Share of total sold, scaled by `10^precision`.
    pub percent: u128,
    pub precision: u128,
}

impl Reservation {
    /// `floor(total_sold * percent / 10^(2 + precision)) + tokens + previous_balance`.
    pub fn distribution_amount(
        &self,
        total_sold: u128,
        previous_balance: u128,
    ) -> Result<u128, ApplicationException> {
        let overflow = || ApplicationException::new(reasons::DEFAULT_EXCEPTION);
        let share = total_sold.checked_mul(self.percent).ok_or_else(overflow)?;
        // A divisor beyond u128 exceeds any share, so the quotient is zero.
        let share = u32::try_from(self.precision)
            .ok()
            .and_then(|precision| precision.checked_add(2))
            .and_then(|exponent| 10u128.checked_pow(exponent))
            .map_or(0, |divisor| share / divisor);
        share
            .checked_add(self.tokens)
            .and_then(|amount| amount.checked_add(previous_balance))
            .ok_or_else(overflow)
    }
}

/// In-memory view of a reservation list.
#[derive(Debug, Clone)]
pub struct ReservationBook {
    layout: ReservationLayout,
    loaded: Vec<Reservation>,
    entries: Vec<Reservation>,
}

impl ReservationBook {
    pub fn load(
        reader: &StorageReader<'_>,
        layout: ReservationLayout,
    ) -> Result<Self, ApplicationException> {
        let len = reader.read_u64(layout.list())?;
        let mut entries = Vec::with_capacity(len.min(256) as usize);
        for index in 0..len {
            let destination = reader.read_address(layout.list_item(index));
            entries.push(Reservation {
                destination,
                tokens: reader.read_u128(layout.tokens(destination))?,
                percent: reader.read_u128(layout.percent(destination))?,
                precision: reader.read_u128(layout.precision(destination))?,
            });
        }
        Ok(Self {
            layout,
            loaded: entries.clone(),
            entries,
        })
    }

    pub fn layout(&self) -> ReservationLayout {
        self.layout
    }

    /// Destinations in list order.
    pub fn destinations(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.iter().map(|entry| entry.destination)
    }

    pub fn entries(&self) -> &[Reservation] {
        &self.entries
    }

    pub fn get(&self, destination: Address) -> Option<&Reservation> {
        self.entries
            .iter()
            .find(|entry| entry.destination == destination)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `reservation`, or replaces the allocation of an existing destination
    /// in place.
    pub fn upsert(&mut self, reservation: Reservation) -> Result<(), ApplicationException> {
        ensure(
            !reservation.destination.is_zero(),
            reasons::INVALID_DESTINATION,
        )?;
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.destination == reservation.destination)
        {
            Some(entry) => *entry = reservation,
            None => self.entries.push(reservation),
        }
        Ok(())
    }

    /// Upserts parallel arrays of allocations.
    pub fn upsert_many(
        &mut self,
        destinations: &[Address],
        tokens: &[u128],
        percents: &[u128],
        precisions: &[u128],
    ) -> Result<(), ApplicationException> {
        ensure(
            !destinations.is_empty() && destinations.len() <= MAX_DESTINATIONS_PER_CALL,
            reasons::DEFAULT_EXCEPTION,
        )?;
        ensure(
            tokens.len() == destinations.len()
                && percents.len() == destinations.len()
                && precisions.len() == destinations.len(),
            reasons::ARRAY_LEN_MISMATCH,
        )?;
        for (i, destination) in destinations.iter().enumerate() {
            self.upsert(Reservation {
                destination: *destination,
                tokens: tokens[i],
                percent: percents[i],
                precision: precisions[i],
            })?;
        }
        Ok(())
    }

    /// Removes `destination` by moving the last entry into its position.
    pub fn remove(&mut self, destination: Address) -> Result<Reservation, ApplicationException> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.destination == destination)
            .ok_or_else(|| ApplicationException::new(reasons::INVALID_DESTINATION))?;
        Ok(self.entries.swap_remove(position))
    }

    /// Takes up to `amount` entries from the tail of the list, last first.
    pub fn take_for_distribution(
        &mut self,
        amount: usize,
        finalized: bool,
    ) -> Result<Vec<Reservation>, ApplicationException> {
        ensure(amount > 0, reasons::INVALID_AMT)?;
        ensure(finalized, reasons::CROWDSALE_NOT_FINALIZED)?;
        ensure(!self.entries.is_empty(), reasons::NO_REMAINING_DESTINATIONS)?;

        let keep = self.entries.len() - amount.min(self.entries.len());
        let mut taken = self.entries.split_off(keep);
        taken.reverse();
        Ok(taken)
    }

    /// Writes every slot that differs from what was loaded.
    pub fn persist(&self, effects: &mut EffectSet) {
        let layout = &self.layout;
        if self.entries.len() != self.loaded.len() {
            effects.set(layout.list(), self.entries.len() as u64);
        }

        for (index, entry) in self.entries.iter().enumerate() {
            if self.loaded.get(index) == Some(entry) {
                continue;
            }
            let destination = entry.destination;
            effects
                .set(layout.list_item(index as u64), destination)
                .set(layout.list_index(destination), index as u64 + 1)
                .set(layout.tokens(destination), entry.tokens)
                .set(layout.percent(destination), entry.percent)
                .set(layout.precision(destination), entry.precision);
        }

        for index in self.entries.len()..self.loaded.len() {
            effects.set(layout.list_item(index as u64), Word::ZERO);
        }

        for old in &self.loaded {
            if self.get(old.destination).is_none() {
                effects
                    .set(layout.list_index(old.destination), Word::ZERO)
                    .set(layout.tokens(old.destination), Word::ZERO)
                    .set(layout.percent(old.destination), Word::ZERO)
                    .set(layout.precision(old.destination), Word::ZERO);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexec_primitives::ExecutionId;
    use rexec_store::{MemoryStore, Store, WriteBatch};

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn reservation(n: u64) -> Reservation {
        Reservation {
            destination: addr(n),
            tokens: n as u128 * 10,
            percent: 1,
            precision: 0,
        }
    }

    fn layout() -> ReservationLayout {
        ReservationLayout::new("test.reservations")
    }

    /// Persists `book` and loads it back.
    fn commit(store: &MemoryStore, id: ExecutionId, book: &ReservationBook) -> ReservationBook {
        let mut effects = EffectSet::new();
        book.persist(&mut effects);
        let mut batch = WriteBatch::new(id);
        for write in effects.storage_writes() {
            batch.put(write.key, write.value);
        }
        store.write_batch(batch).unwrap();
        ReservationBook::load(&StorageReader::new(store, id), layout()).unwrap()
    }

    #[test]
    fn test_distribution_amount() {
        let entry = Reservation {
            destination: addr(1),
            tokens: 300,
            percent: 30,
            precision: 3,
        };
        assert_eq!(entry.distribution_amount(1_000_000, 0).unwrap(), 600);
        assert_eq!(entry.distribution_amount(1_000_000, 50).unwrap(), 650);
        assert_eq!(entry.distribution_amount(0, 0).unwrap(), 300);
    }

    #[test]
    fn test_distribution_amount_huge_precision() {
        let entry = Reservation {
            destination: addr(1),
            tokens: 7,
            percent: 100,
            precision: 80,
        };
        assert_eq!(entry.distribution_amount(u64::MAX as u128, 0).unwrap(), 7);
    }

    #[test]
    fn test_removal_swaps_with_last() {
        let store = MemoryStore::new();
        let id = ExecutionId::derive(&[b"book"]);
        let mut book = ReservationBook::load(&StorageReader::new(&store, id), layout()).unwrap();
        for n in 1..=4 {
            book.upsert(reservation(n)).unwrap();
        }
        let mut book = commit(&store, id, &book);
        assert_eq!(book.destinations().collect::<Vec<_>>(), vec![addr(1), addr(2), addr(3), addr(4)]);

        book.remove(addr(2)).unwrap();
        let book = commit(&store, id, &book);
        assert_eq!(book.destinations().collect::<Vec<_>>(), vec![addr(1), addr(4), addr(3)]);

        let reader = StorageReader::new(&store, id);
        assert_eq!(reader.read_u128(layout().list_index(addr(4))).unwrap(), 2);
        assert_eq!(reader.read(layout().tokens(addr(2))), Word::ZERO);
        assert_eq!(reader.read(layout().list_item(3)), Word::ZERO);
    }

    #[test]
    fn test_remove_unknown_destination() {
        let mut book = ReservationBook {
            layout: layout(),
            loaded: vec![],
            entries: vec![reservation(1)],
        };
        assert_eq!(
            book.remove(addr(9)).unwrap_err().reason(),
            reasons::INVALID_DESTINATION
        );
    }

    #[test]
    fn test_upsert_many_validation() {
        let mut book = ReservationBook {
            layout: layout(),
            loaded: vec![],
            entries: vec![],
        };
        let many: Vec<Address> = (1..=21).map(addr).collect();
        let zeros = vec![0u128; 21];
        assert_eq!(
            book.upsert_many(&many, &zeros, &zeros, &zeros).unwrap_err().reason(),
            reasons::DEFAULT_EXCEPTION
        );
        assert_eq!(
            book.upsert_many(&[addr(1)], &[1, 2], &[0], &[0]).unwrap_err().reason(),
            reasons::ARRAY_LEN_MISMATCH
        );
        assert_eq!(
            book.upsert_many(&[Address::zero()], &[1], &[0], &[0]).unwrap_err().reason(),
            reasons::INVALID_DESTINATION
        );

        book.upsert_many(&[addr(1), addr(2)], &[5, 6], &[0, 0], &[0, 0]).unwrap();
        book.upsert_many(&[addr(1)], &[50], &[1], &[1]).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(addr(1)).unwrap().tokens, 50);
    }

    #[test]
    fn test_take_for_distribution_guards_and_cap() {
        let mut book = ReservationBook {
            layout: layout(),
            loaded: vec![],
            entries: vec![reservation(1), reservation(2), reservation(3)],
        };
        assert_eq!(
            book.take_for_distribution(0, true).unwrap_err().reason(),
            reasons::INVALID_AMT
        );
        assert_eq!(
            book.take_for_distribution(1, false).unwrap_err().reason(),
            reasons::CROWDSALE_NOT_FINALIZED
        );

        let taken = book.take_for_distribution(2, true).unwrap();
        assert_eq!(taken, vec![reservation(3), reservation(2)]);

        let taken = book.take_for_distribution(10, true).unwrap();
        assert_eq!(taken, vec![reservation(1)]);

        assert_eq!(
            book.take_for_distribution(1, true).unwrap_err().reason(),
            reasons::NO_REMAINING_DESTINATIONS
        );
    }
}
