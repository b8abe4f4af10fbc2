//! Lazy record streams
//!
//! Every stage hands its downstream a boxed iterator. Stages that must see
//! their whole input (sort, whole-stream group, join) use [`materialize_then`],
//! which does not touch the upstream until the first record is pulled.

use crate::error::Result;
use crate::record::Record;

/// A lazy, fallible sequence of records
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// Stream over an in-memory list
pub fn from_vec<'a>(records: Vec<Record>) -> RecordStream<'a> {
    Box::new(records.into_iter().map(Ok))
}

/// Collect the upstream on first pull, run `finish` over it, then yield its output
pub(crate) fn materialize_then<'a, F>(upstream: RecordStream<'a>, finish: F) -> RecordStream<'a>
where
    F: FnOnce(Vec<Record>) -> Result<Vec<Record>> + 'a,
{
    Box::new(Deferred {
        state: State::Pending(upstream, finish),
    })
}

enum State<'a, F> {
    Pending(RecordStream<'a>, F),
    Draining(std::vec::IntoIter<Record>),
    Done,
}

struct Deferred<'a, F> {
    state: State<'a, F>,
}

impl<F> Iterator for Deferred<'_, F>
where
    F: FnOnce(Vec<Record>) -> Result<Vec<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Pending(upstream, finish) => {
                    let records = match upstream.collect::<Result<Vec<_>>>() {
                        Ok(records) => records,
                        Err(e) => return Some(Err(e)),
                    };
                    match finish(records) {
                        Ok(output) => self.state = State::Draining(output.into_iter()),
                        Err(e) => return Some(Err(e)),
                    }
                }
                State::Draining(mut records) => {
                    let next = records.next();
                    if next.is_some() {
                        self.state = State::Draining(records);
                    }
                    return next.map(Ok);
                }
                State::Done => return None,
            }
        }
    }
}
