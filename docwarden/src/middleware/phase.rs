use std::fmt::Display;

/// The kind of write a document goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
    Remove,
}

impl Operation {
    /// Phase run before the document is persisted.
    pub fn before(&self) -> Phase {
        match self {
            Operation::Insert => Phase::BeforeInsert,
            Operation::Update => Phase::BeforeUpdate,
            Operation::Remove => Phase::BeforeRemove,
        }
    }

    /// Phase run after the document has been persisted.
    pub fn after(&self) -> Phase {
        match self {
            Operation::Insert => Phase::AfterInsert,
            Operation::Update => Phase::AfterUpdate,
            Operation::Remove => Phase::AfterRemove,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Insert => write!(f, "insert"),
            Operation::Update => write!(f, "update"),
            Operation::Remove => write!(f, "remove"),
        }
    }
}

/// A named point in a document's write lifecycle at which hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BeforeInsert,
    AfterInsert,
    BeforeUpdate,
    AfterUpdate,
    BeforeRemove,
    AfterRemove,
}

impl Phase {
    /// Whether the phase runs before persistence. Failures in these phases
    /// reject the document; failures afterwards are only reported.
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            Phase::BeforeInsert | Phase::BeforeUpdate | Phase::BeforeRemove
        )
    }

    pub fn operation(&self) -> Operation {
        match self {
            Phase::BeforeInsert | Phase::AfterInsert => Operation::Insert,
            Phase::BeforeUpdate | Phase::AfterUpdate => Operation::Update,
            Phase::BeforeRemove | Phase::AfterRemove => Operation::Remove,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::BeforeInsert => write!(f, "beforeInsert"),
            Phase::AfterInsert => write!(f, "afterInsert"),
            Phase::BeforeUpdate => write!(f, "beforeUpdate"),
            Phase::AfterUpdate => write!(f, "afterUpdate"),
            Phase::BeforeRemove => write!(f, "beforeRemove"),
            Phase::AfterRemove => write!(f, "afterRemove"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_phases_round_trip() {
        for operation in [Operation::Insert, Operation::Update, Operation::Remove] {
            assert!(operation.before().is_before());
            assert!(!operation.after().is_before());
            assert_eq!(operation.before().operation(), operation);
            assert_eq!(operation.after().operation(), operation);
        }
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::BeforeInsert.to_string(), "beforeInsert");
        assert_eq!(Phase::AfterRemove.to_string(), "afterRemove");
        assert_eq!(Phase::BeforeUpdate.to_string(), "beforeUpdate");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Update.to_string(), "update");
    }
}
