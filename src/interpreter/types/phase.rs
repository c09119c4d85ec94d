//! Execution phase enums for statements that take more than one step

/// Phase for single-expression statements (expression, declaration, assignment,
/// return) that may await their right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplePhase {
    /// Evaluate the right-hand side
    Eval,
    /// Suspended on an await; finish with the resume completion
    Awaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfPhase {
    Test,
    /// Branch has been pushed (or skipped); pop on next step
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForPhase {
    Init,
    Test,
    /// Body finished (or continued); run the update clause
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryPhase {
    /// Try block not pushed yet
    Enter,
    /// Executing the try block
    Body,
    /// Executing the catch block (error was caught)
    Catch,
    /// Executing the finally block
    Finally,
}
