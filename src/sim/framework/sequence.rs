use super::ScienceOperator;

/// Ordered list of operators applied once per iteration.
///
/// Operator `k` finishes on every cell before operator `k + 1` starts anywhere.
#[derive(Default)]
pub struct OperatorSequence {
    operators: Vec<Box<dyn ScienceOperator>>,
}

impl OperatorSequence {
    pub fn new() -> Self {
        Self { operators: vec![] }
    }

    pub fn with_operator<O: ScienceOperator + 'static>(mut self, operator: O) -> Self {
        self.operators.push(Box::new(operator));
        self
    }

    pub fn push(&mut self, operator: Box<dyn ScienceOperator>) {
        self.operators.push(operator);
    }

    /// Inserts `operator` ahead of everything already in the sequence.
    pub fn prepend(&mut self, operator: Box<dyn ScienceOperator>) {
        self.operators.insert(0, operator);
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|o| o.name()).collect()
    }

    pub fn as_slice(&self) -> &[Box<dyn ScienceOperator>] {
        &self.operators
    }

    pub fn into_vec(self) -> Vec<Box<dyn ScienceOperator>> {
        self.operators
    }
}
