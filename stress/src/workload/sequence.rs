use std::iter::FusedIterator;

use crate::types::{MigrationRequest, WriteTask};

/// One entry of the submission sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Write(WriteTask),
    Migration(MigrationRequest),
}

/// Interleaves the write tasks with a single migration request.
///
/// The request is yielded right after the write whose index equals `position`. When no write
/// carries that index, which is the case when `position` equals the number of writes, the
/// request follows the last write instead. The request is yielded exactly once.
#[derive(Debug)]
pub struct SubmissionSequence<I> {
    tasks: I,
    position: u64,
    migration: Option<MigrationRequest>,
    last_index: Option<u64>,
}

impl<I> SubmissionSequence<I>
where
    I: Iterator<Item = WriteTask>,
{
    pub fn new(tasks: I, position: u64, migration: MigrationRequest) -> Self {
        Self {
            tasks,
            position,
            migration: Some(migration),
            last_index: None,
        }
    }
}

impl<I> Iterator for SubmissionSequence<I>
where
    I: Iterator<Item = WriteTask>,
{
    type Item = Submission;

    fn next(&mut self) -> Option<Self::Item> {
        if self.last_index == Some(self.position)
            && let Some(migration) = self.migration.take()
        {
            return Some(Submission::Migration(migration));
        }

        match self.tasks.next() {
            Some(task) => {
                self.last_index = Some(task.index());
                Some(Submission::Write(task))
            }
            None => self.migration.take().map(Submission::Migration),
        }
    }
}

impl<I> FusedIterator for SubmissionSequence<I> where I: FusedIterator<Item = WriteTask> {}
