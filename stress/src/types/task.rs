use crate::types::Value;

/// One row insertion, identified by its position in the workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTask {
    index: u64,
    values: Vec<Value>,
}

impl WriteTask {
    /// Creates a task writing `values`, in table column order, at position `index`.
    pub fn new(index: u64, values: Vec<Value>) -> Self {
        Self { index, values }
    }

    /// Returns the position of the task in the workload.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the row values in table column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the task and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
