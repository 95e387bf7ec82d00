use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::iter::FusedIterator;

use config::shared::{ColumnType, SchemaConfig};

use crate::types::{Value, WriteTask};

/// Produces the column values of the row written at a given index.
pub trait RowSynthesizer: Send {
    /// Returns the values of row `index`, in table column order.
    fn synthesize(&mut self, index: u64) -> Vec<Value>;
}

impl<F> RowSynthesizer for F
where
    F: FnMut(u64) -> Vec<Value> + Send,
{
    fn synthesize(&mut self, index: u64) -> Vec<Value> {
        self(index)
    }
}

/// Default synthesis rule, driven by the column types of the table.
///
/// For the column at position `c`:
/// - `bigint` columns hold `index + c * value_offset`,
/// - `varchar` columns hold `"{table}-{index:05}"`,
/// - `int` columns hold a uniformly random integer.
///
/// Every value is therefore a function of the index except the random integers.
#[derive(Debug)]
pub struct ColumnSynthesizer {
    table: String,
    column_types: Vec<ColumnType>,
    value_offset: i64,
    rng: StdRng,
}

impl ColumnSynthesizer {
    /// Creates a synthesizer for `schema` seeded from the operating system.
    pub fn new(schema: &SchemaConfig, value_offset: i64) -> Self {
        Self::with_rng(schema, value_offset, StdRng::from_entropy())
    }

    /// Creates a synthesizer whose random values are reproducible.
    pub fn with_seed(schema: &SchemaConfig, value_offset: i64, seed: u64) -> Self {
        Self::with_rng(schema, value_offset, StdRng::seed_from_u64(seed))
    }

    fn with_rng(schema: &SchemaConfig, value_offset: i64, rng: StdRng) -> Self {
        Self {
            table: schema.table.clone(),
            column_types: schema
                .columns
                .iter()
                .map(|column| column.column_type)
                .collect(),
            value_offset,
            rng,
        }
    }
}

impl RowSynthesizer for ColumnSynthesizer {
    fn synthesize(&mut self, index: u64) -> Vec<Value> {
        let base = i64::try_from(index).unwrap_or(i64::MAX);

        self.column_types
            .iter()
            .enumerate()
            .map(|(position, column_type)| match column_type {
                ColumnType::BigInt => {
                    let shift = (position as i64).saturating_mul(self.value_offset);
                    Value::BigInt(base.saturating_add(shift))
                }
                ColumnType::Varchar => Value::Text(format!("{}-{index:05}", self.table)),
                ColumnType::Int => Value::Int(self.rng.gen_range(i32::MIN..=i32::MAX)),
            })
            .collect()
    }
}

/// Lazy, finite sequence of write tasks with indexes `0..row_count`.
///
/// The generator is consumed as it is iterated and cannot be restarted.
#[derive(Debug)]
pub struct TaskGenerator<S> {
    next_index: u64,
    row_count: u64,
    synthesizer: S,
}

impl<S> TaskGenerator<S>
where
    S: RowSynthesizer,
{
    pub fn new(row_count: u64, synthesizer: S) -> Self {
        Self {
            next_index: 0,
            row_count,
            synthesizer,
        }
    }
}

impl<S> Iterator for TaskGenerator<S>
where
    S: RowSynthesizer,
{
    type Item = WriteTask;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.row_count {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;

        Some(WriteTask::new(index, self.synthesizer.synthesize(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.row_count - self.next_index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<S> FusedIterator for TaskGenerator<S> where S: RowSynthesizer {}
