use std::{collections::VecDeque, iter::FusedIterator, marker::PhantomData, num::NonZeroUsize};

use crate::{
    domain::{Record, RecordError},
    remote::Error,
};

/// A demand-driven iterator over a paginated listing.
///
/// A page of at most `limit` records is requested only once the previous
/// page has been consumed. The offset advances by the number of records
/// actually returned, and a page shorter than `limit` ends the listing, so a
/// listing of `n` records costs `n / limit + 1` requests.
///
/// A failed request ends the iteration after yielding the error.
pub struct Pages<F, T, E> {
    fetch: F,
    decode: fn(&Record) -> Result<T, RecordError>,
    limit: NonZeroUsize,
    offset: usize,
    buffer: VecDeque<Record>,
    exhausted: bool,
    error: PhantomData<fn() -> E>,
}

impl<F, T, E> Pages<F, T, E>
where
    F: FnMut(usize, usize) -> Result<Vec<Record>, Error<E>>,
{
    /// Creates a listing that calls `fetch(limit, offset)` for each page and
    /// decodes every record with `decode`.
    pub fn new(
        fetch: F,
        decode: fn(&Record) -> Result<T, RecordError>,
        limit: NonZeroUsize,
    ) -> Self {
        Self {
            fetch,
            decode,
            limit,
            offset: 0,
            buffer: VecDeque::new(),
            exhausted: false,
            error: PhantomData,
        }
    }

    /// Starts the listing at `offset` instead of at the first record.
    #[must_use]
    pub const fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// The offset the next page will be requested at.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<F, T, E> Iterator for Pages<F, T, E>
where
    F: FnMut(usize, usize) -> Result<Vec<Record>, Error<E>>,
{
    type Item = Result<T, Error<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some((self.decode)(&record).map_err(Error::from));
            }
            if self.exhausted {
                return None;
            }
            match (self.fetch)(self.limit.get(), self.offset) {
                Ok(page) => {
                    self.exhausted = page.len() < self.limit.get();
                    self.offset += page.len();
                    self.buffer.extend(page);
                }
                Err(error) => {
                    self.exhausted = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl<F, T, E> FusedIterator for Pages<F, T, E> where
    F: FnMut(usize, usize) -> Result<Vec<Record>, Error<E>>
{
}
