use std::collections::BTreeMap;
use std::ops::{BitAnd, BitOr, Not};

use itertools::zip_eq;

use crate::error::ConfigurationError;
use crate::pid::{PidCategory, PidTable};
use crate::record::{Field, ObjectRecord, Record};

/// A predicate over the rows of a table
///
/// The selection keeps a handle to the table it was derived from, so
/// the boolean vector can never be applied to a different table.
/// Combining selections over different tables is a logic error and
/// panics.
#[derive(Clone, Debug)]
pub struct Selection<'t, R> {
    rows: &'t [R],
    bits: Vec<bool>,
}

impl<'t, R> Selection<'t, R> {
    /// Select the rows where `pred` is true
    pub fn from_fn<F>(rows: &'t [R], pred: F) -> Self
    where
        F: FnMut(&R) -> bool,
    {
        let bits = rows.iter().map(pred).collect();
        Self { rows, bits }
    }

    /// Select every row
    pub fn all(rows: &'t [R]) -> Self {
        Self::from_fn(rows, |_| true)
    }

    /// Select no row
    pub fn none(rows: &'t [R]) -> Self {
        Self::from_fn(rows, |_| false)
    }

    /// The underlying table rows, selected or not
    pub fn rows(&self) -> &'t [R] {
        self.rows
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of selected rows
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    /// Number of rows selected by both `self` and `other`
    pub fn count_and(&self, other: &Self) -> usize {
        self.check_same_table(other);
        zip_eq(&self.bits, &other.bits)
            .filter(|(a, b)| **a && **b)
            .count()
    }

    /// Iterator over the selected rows
    pub fn iter(&self) -> impl Iterator<Item = &'t R> + '_ {
        let rows = self.rows;
        zip_eq(rows, &self.bits).filter_map(|(r, b)| b.then_some(r))
    }

    /// Iterator over the indices of the selected rows
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(n, b)| b.then_some(n))
    }

    /// Narrow down the selection by an additional predicate
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&R) -> bool,
    {
        let bits = zip_eq(self.rows, &self.bits)
            .map(|(r, b)| *b && pred(r))
            .collect();
        Self {
            rows: self.rows,
            bits,
        }
    }

    pub fn and(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a || b)
    }

    pub fn complement(&self) -> Self {
        Self {
            rows: self.rows,
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    fn combine(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        self.check_same_table(other);
        let bits = zip_eq(&self.bits, &other.bits)
            .map(|(a, b)| op(*a, *b))
            .collect();
        Self {
            rows: self.rows,
            bits,
        }
    }

    fn check_same_table(&self, other: &Self) {
        assert!(
            std::ptr::eq(self.rows, other.rows),
            "Combining selections over different tables"
        );
    }
}

impl<'t, R: Record> Selection<'t, R> {
    /// Selected row indices grouped by event, in ascending event order
    pub fn by_event(&self) -> BTreeMap<u64, Vec<usize>> {
        let mut events: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for idx in self.indices() {
            events
                .entry(self.rows[idx].event_id())
                .or_default()
                .push(idx);
        }
        events
    }
}

impl<'a, 't, R> BitAnd for &'a Selection<'t, R> {
    type Output = Selection<'t, R>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<'a, 't, R> BitOr for &'a Selection<'t, R> {
    type Output = Selection<'t, R>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<'a, 't, R> Not for &'a Selection<'t, R> {
    type Output = Selection<'t, R>;

    fn not(self) -> Self::Output {
        self.complement()
    }
}

/// Builds reusable selections from table columns and particle ids
#[derive(Copy, Clone, Debug)]
pub struct MaskEngine<'p> {
    pids: &'p PidTable,
}

impl<'p> MaskEngine<'p> {
    pub fn new(pids: &'p PidTable) -> Self {
        Self { pids }
    }

    /// Rows where `field` is present and not NaN
    pub fn validity_mask<'t, R, F>(
        &self,
        rows: &'t [R],
        field: F,
    ) -> Selection<'t, R>
    where
        F: Field<R>,
    {
        Selection::from_fn(rows, |r| {
            field.value(r).map(|v| !v.is_nan()).unwrap_or(false)
        })
    }

    /// Rows whose truth particle id belongs to `category`
    ///
    /// Rows without a truth object are only selected for
    /// [PidCategory::All].
    pub fn pid_mask<'t>(
        &self,
        rows: &'t [ObjectRecord],
        category: PidCategory,
    ) -> Selection<'t, ObjectRecord> {
        if category == PidCategory::All {
            return Selection::all(rows);
        }
        Selection::from_fn(rows, |r| {
            r.truth()
                .map(|t| self.pids.contains(category, t.pid))
                .unwrap_or(false)
        })
    }

    /// Like [pid_mask](Self::pid_mask), with the category given by name
    pub fn pid_mask_by_name<'t>(
        &self,
        rows: &'t [ObjectRecord],
        category: &str,
    ) -> Result<Selection<'t, ObjectRecord>, ConfigurationError> {
        Ok(self.pid_mask(rows, category.parse()?))
    }

    /// Rows whose predicted class corresponds to `category`
    ///
    /// Rows without a prediction are only selected for
    /// [PidCategory::All].
    pub fn pred_class_mask<'t>(
        &self,
        rows: &'t [ObjectRecord],
        category: PidCategory,
    ) -> Selection<'t, ObjectRecord> {
        if category == PidCategory::All {
            return Selection::all(rows);
        }
        let filter = self.pids.class_filter(category);
        Selection::from_fn(rows, |r| {
            r.pred().map(|p| filter.accepts(p.class)).unwrap_or(false)
        })
    }

    /// Rows belonging to the given event
    pub fn event_mask<'t, R: Record>(
        &self,
        rows: &'t [R],
        event_id: u64,
    ) -> Selection<'t, R> {
        Selection::from_fn(rows, |r| r.event_id() == event_id)
    }

    /// Rows with both a valid truth and a valid predicted energy
    pub fn matched_mask<'t>(
        &self,
        rows: &'t [ObjectRecord],
    ) -> Selection<'t, ObjectRecord> {
        use crate::record::ObjectField::{PredEnergy, TruthEnergy};
        &self.validity_mask(rows, TruthEnergy)
            & &self.validity_mask(rows, PredEnergy)
    }

    /// Rows flagged as matched by the matching stage
    pub fn matched_flag_mask<'t>(
        &self,
        rows: &'t [ObjectRecord],
    ) -> Selection<'t, ObjectRecord> {
        Selection::from_fn(rows, |r| r.is_matched())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ObjectField, PredictedObject, TruthObject};
    use particle_id::ParticleID;

    fn truth(energy: f64, pid: i32) -> TruthObject {
        TruthObject {
            energy,
            eta: 0.,
            phi: 0.,
            pid: ParticleID::new(pid),
        }
    }

    fn pred(energy: f64, class: i64) -> PredictedObject {
        PredictedObject {
            energy,
            eta: 0.,
            phi: 0.,
            class,
        }
    }

    fn table() -> Vec<ObjectRecord> {
        vec![
            ObjectRecord::matched(0, truth(2., 22), pred(2.1, 0)),
            ObjectRecord::missed(0, truth(3., 2112)),
            ObjectRecord::fake(1, pred(4., 1)),
            ObjectRecord::matched(2, truth(f64::NAN, 211), pred(5., 2)),
        ]
    }

    #[test]
    fn validity() {
        let pids = PidTable::default();
        let engine = MaskEngine::new(&pids);
        let rows = table();
        let truth = engine.validity_mask(&rows, ObjectField::TruthEnergy);
        assert_eq!(truth.bits(), &[true, true, false, false]);
        let pred = engine.validity_mask(&rows, ObjectField::PredEnergy);
        assert_eq!(pred.bits(), &[true, false, true, true]);
        assert_eq!(
            engine.matched_mask(&rows).bits(),
            &[true, false, false, false]
        );
        assert_eq!(
            engine.matched_flag_mask(&rows).bits(),
            &[true, false, false, true]
        );
    }

    #[test]
    fn pid() {
        let pids = PidTable::default();
        let engine = MaskEngine::new(&pids);
        let rows = table();
        let photon = engine.pid_mask(&rows, PidCategory::Photon);
        assert_eq!(photon.bits(), &[true, false, false, false]);
        let nh = engine.pid_mask_by_name(&rows, "neutral_hadron").unwrap();
        assert_eq!(nh.bits(), &[false, true, false, false]);
        assert_eq!(engine.pid_mask(&rows, PidCategory::All).count(), 4);
        assert!(engine.pid_mask_by_name(&rows, "quark").is_err());

        let nh_pred = engine.pred_class_mask(&rows, PidCategory::NeutralHadron);
        assert_eq!(nh_pred.bits(), &[false, false, true, false]);
    }

    #[test]
    fn combine() {
        let pids = PidTable::default();
        let engine = MaskEngine::new(&pids);
        let rows = table();
        let ev0 = engine.event_mask(&rows, 0);
        let pred = engine.validity_mask(&rows, ObjectField::PredEnergy);
        assert_eq!((&ev0 & &pred).bits(), &[true, false, false, false]);
        assert_eq!((&ev0 | &pred).count(), 4);
        assert_eq!((!&ev0).bits(), &[false, false, true, true]);
        assert_eq!(ev0.count_and(&pred), 1);
        let events = pred.by_event();
        assert_eq!(events.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(events[&0], vec![0]);
    }

    #[test]
    #[should_panic]
    fn different_tables() {
        let rows = table();
        let other = table();
        let _ = &Selection::all(&rows) & &Selection::all(&other);
    }
}
