use std::{fmt, iter::FusedIterator};

use crate::deletion::{Deletion, Outcome};

/// Position of an item within a bulk operation, counted from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// One-based index of the current item.
    pub position: usize,
    /// Number of items in the operation.
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}/{})", self.position, self.total)
    }
}

type Step<H, T> = fn(&mut H, T, Progress) -> Result<Outcome<T>, <H as Deletion>::Error>;

/// A lazy bulk deletion.
///
/// Each call to [`Iterator::next`] handles exactly one item, in input order.
/// Nothing happens for items that are never pulled. The first failure is
/// yielded and ends the iteration; the effects of earlier items stay applied.
pub struct Bulk<'h, H: Deletion + ?Sized, T> {
    handler: &'h mut H,
    items: std::iter::Enumerate<std::vec::IntoIter<T>>,
    total: usize,
    step: Step<H, T>,
    failed: bool,
}

impl<'h, H: Deletion + ?Sized, T> Bulk<'h, H, T> {
    pub(crate) fn new(handler: &'h mut H, items: Vec<T>, step: Step<H, T>) -> Self {
        Self {
            handler,
            total: items.len(),
            items: items.into_iter().enumerate(),
            step,
            failed: false,
        }
    }
}

impl<H: Deletion + ?Sized, T> Iterator for Bulk<'_, H, T> {
    type Item = Result<Outcome<T>, H::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (index, item) = self.items.next()?;
        let progress = Progress {
            position: index + 1,
            total: self.total,
        };
        let result = (self.step)(&mut *self.handler, item, progress);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.items.len()))
        }
    }
}

impl<H: Deletion + ?Sized, T> FusedIterator for Bulk<'_, H, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, SectionId};

    /// Records every id it sees and fails on the configured one.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<u64>,
        fail_on: Option<u64>,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Refused(u64);

    impl Recorder {
        fn step<T: Copy + Into<u64>>(&mut self, id: T, _: Progress) -> Result<Outcome<T>, Refused> {
            let raw = id.into();
            self.seen.push(raw);
            if self.fail_on == Some(raw) {
                return Err(Refused(raw));
            }
            Ok(Outcome::Deleted(id))
        }
    }

    impl Deletion for Recorder {
        type Error = Refused;

        fn delete_section(&mut self, section_id: SectionId) -> Result<Outcome<SectionId>, Refused> {
            self.step(section_id, Progress { position: 1, total: 1 })
        }

        fn delete_case(&mut self, case_id: CaseId) -> Result<Outcome<CaseId>, Refused> {
            self.step(case_id, Progress { position: 1, total: 1 })
        }

        fn delete_sections(&mut self, section_ids: Vec<SectionId>) -> Bulk<'_, Self, SectionId> {
            Bulk::new(self, section_ids, Self::step)
        }

        fn delete_cases(&mut self, case_ids: Vec<CaseId>) -> Bulk<'_, Self, CaseId> {
            Bulk::new(self, case_ids, Self::step)
        }
    }

    fn ids(raw: &[u64]) -> Vec<CaseId> {
        raw.iter().copied().map(CaseId::new).collect()
    }

    #[test]
    fn handles_items_lazily_in_order() {
        let mut recorder = Recorder::default();

        let mut bulk = recorder.delete_cases(ids(&[3, 1, 2]));
        assert_eq!(bulk.size_hint(), (0, Some(3)));
        assert_eq!(bulk.next(), Some(Ok(Outcome::Deleted(CaseId::new(3)))));
        drop(bulk);

        assert_eq!(recorder.seen, [3]);
    }

    #[test]
    fn failure_stops_the_run() {
        let mut recorder = Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        };

        let results: Vec<_> = recorder.delete_cases(ids(&[1, 2, 3])).collect();

        assert_eq!(
            results,
            [Ok(Outcome::Deleted(CaseId::new(1))), Err(Refused(2))]
        );
        assert_eq!(recorder.seen, [1, 2]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut recorder = Recorder::default();
        assert_eq!(recorder.delete_sections(Vec::new()).count(), 0);
    }

    #[test]
    fn progress_is_one_based() {
        let progress = Progress { position: 2, total: 5 };
        assert_eq!(progress.to_string(), "(2/5)");
    }
}
