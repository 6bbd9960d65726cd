//! BASIC interpreter with generator-based execution
//!
//! The line loop runs inside a generator that yields console effects
//! (PRINT output, CLS). [`Interpreter::execute`] drains those effects into a
//! [`Console`] until the generator completes, so a run always goes to
//! completion within one call.

use crate::basic::error::BasicError;
use crate::basic::parser::{Comparator, Condition, PrintArg, Program, Stmt, Then};
use crate::basic::variables::{Value, VariableStore};
use crate::console::Console;
use async_recursion::async_recursion;
use genawaiter::rc::{Co, Gen};
use genawaiter::GeneratorState;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Top-level line executions allowed before a run is treated as an
/// infinite loop.
pub const DEFAULT_MAX_LINES: usize = 100;

/// Execution limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of top-level line executions. Lines inside a THEN
    /// block do not count.
    pub max_lines: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_lines: DEFAULT_MAX_LINES }
    }
}

/// How a run finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Control fell off the end of the program
    Completed,
    /// An END statement ran
    Ended,
}

/// Effects yielded by the execution generator
#[derive(Debug, Clone, PartialEq)]
pub enum YieldReason {
    /// One PRINT entry
    Output(String),
    /// CLS
    ClearScreen,
}

/// Internal interpreter state, shared between generator and owner
pub struct InterpreterState {
    pub variables: VariableStore,
    pub current_line: Option<i64>,
    lines_executed: usize,
    limits: Limits,
}

impl InterpreterState {
    fn new(variables: VariableStore, limits: Limits) -> Self {
        Self {
            variables,
            current_line: None,
            lines_executed: 0,
            limits,
        }
    }

    fn reset_counters(&mut self) {
        self.current_line = None;
        self.lines_executed = 0;
    }
}

/// Outcome of running a statement list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Jump(i64),
    End,
}

/// BASIC interpreter
pub struct Interpreter {
    state: Rc<RefCell<InterpreterState>>,
}

impl Interpreter {
    /// `variables` is the store the parser filled while reading declarations.
    pub fn new(variables: VariableStore, limits: Limits) -> Self {
        Self {
            state: Rc::new(RefCell::new(InterpreterState::new(variables, limits))),
        }
    }

    pub fn variables(&self) -> std::cell::Ref<'_, VariableStore> {
        std::cell::Ref::map(self.state.borrow(), |s| &s.variables)
    }

    pub fn lines_executed(&self) -> usize {
        self.state.borrow().lines_executed
    }

    /// Number of the line running (or last run)
    pub fn current_line(&self) -> Option<i64> {
        self.state.borrow().current_line
    }

    /// Execute program synchronously, sending output to `console`
    pub fn execute(
        &mut self,
        program: &Program,
        console: &mut dyn Console,
    ) -> Result<ExecutionResult, BasicError> {
        self.state.borrow_mut().reset_counters();

        let mut generator = create_execution_generator(self.state.clone(), program.clone());
        loop {
            match generator.resume() {
                GeneratorState::Yielded(YieldReason::Output(text)) => console.print(&text)?,
                GeneratorState::Yielded(YieldReason::ClearScreen) => console.clear()?,
                GeneratorState::Complete(result) => return result,
            }
        }
    }
}

/// Create a generator for program execution (standalone to avoid borrow issues)
fn create_execution_generator(
    state: Rc<RefCell<InterpreterState>>,
    program: Program,
) -> Gen<YieldReason, (), impl std::future::Future<Output = Result<ExecutionResult, BasicError>>> {
    Gen::new(|co: Co<YieldReason>| async move { execute_program(&co, &state, &program).await })
}

/// Main program execution loop. `index` is a position in `program.lines`,
/// not a line number.
async fn execute_program(
    co: &Co<YieldReason>,
    state: &Rc<RefCell<InterpreterState>>,
    program: &Program,
) -> Result<ExecutionResult, BasicError> {
    let mut index = 0;

    while let Some(line) = program.lines.get(index) {
        {
            let mut s = state.borrow_mut();
            if s.lines_executed >= s.limits.max_lines {
                return Err(BasicError::InfiniteLoop {
                    line: line.number,
                    limit: s.limits.max_lines,
                });
            }
            s.lines_executed += 1;
            s.current_line = Some(line.number);
        }

        match execute_statements(co, state, line.number, &line.statements).await? {
            Flow::Next => index += 1,
            Flow::Jump(target) => {
                index = program
                    .position_of(target)
                    .ok_or(BasicError::UndefinedLine { line: line.number, target })?;
                tracing::trace!(from = line.number, to = target, "jump");
            }
            Flow::End => {
                tracing::debug!(line = line.number, "end of execution");
                return Ok(ExecutionResult::Ended);
            }
        }
    }

    tracing::debug!("fell off the end of the program");
    Ok(ExecutionResult::Completed)
}

/// Run one line's statements. Returns the pending transfer, if any; when
/// several statements set one, the last wins.
#[async_recursion(?Send)]
async fn execute_statements(
    co: &Co<YieldReason>,
    state: &Rc<RefCell<InterpreterState>>,
    line: i64,
    stmts: &[Stmt],
) -> Result<Flow, BasicError> {
    let mut pending = None;

    for stmt in stmts {
        match stmt {
            Stmt::Print(arg) => {
                let text = resolve_print_arg(state, line, arg)?;
                co.yield_(YieldReason::Output(text)).await;
            }
            Stmt::Cls => co.yield_(YieldReason::ClearScreen).await,
            Stmt::End => return Ok(Flow::End),
            Stmt::GoTo(target) => pending = Some(*target),
            Stmt::If { condition, then_branch } => {
                let holds = {
                    let s = state.borrow();
                    evaluate_condition(&s.variables, condition)
                };
                if !holds {
                    continue;
                }
                match then_branch {
                    Then::Line(target) => pending = Some(*target),
                    Then::Block(records) => {
                        for record in records {
                            match execute_statements(co, state, record.number, &record.statements).await? {
                                Flow::End => return Ok(Flow::End),
                                Flow::Jump(target) => pending = Some(target),
                                Flow::Next => {}
                            }
                        }
                    }
                }
            }
            // Applied while parsing
            Stmt::Declare(_) => {}
        }
    }

    Ok(pending.map_or(Flow::Next, Flow::Jump))
}

fn resolve_print_arg(
    state: &Rc<RefCell<InterpreterState>>,
    line: i64,
    arg: &PrintArg,
) -> Result<String, BasicError> {
    match arg {
        PrintArg::Number(n) => Ok(n.to_string()),
        PrintArg::Text(s) => Ok(s.clone()),
        PrintArg::Variable(name) => {
            let s = state.borrow();
            match s.variables.get(name) {
                Some(value) => Ok(value.to_string()),
                None => Err(BasicError::UndefinedVariable { line, name: name.clone() }),
            }
        }
    }
}

/// Resolve both operands and compare them.
///
/// Numbers compare numerically and text compares lexically. A number never
/// equals, nor orders against, a piece of text.
pub fn evaluate_condition(variables: &VariableStore, condition: &Condition) -> bool {
    let left = variables.resolve_operand(&condition.left);
    let right = variables.resolve_operand(&condition.right);

    let ordering = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => return false,
    };

    match condition.comparator {
        Comparator::Eq => ordering == Ordering::Equal,
        Comparator::Lt => ordering == Ordering::Less,
        Comparator::Gt => ordering == Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::lexer::Lexer;
    use crate::basic::parser::{LineRecord, Parser};
    use crate::basic::variables::Sigil;
    use crate::console::Transcript;

    struct Run {
        output: Transcript,
        result: Result<ExecutionResult, BasicError>,
        lines_executed: usize,
    }

    fn run_with_limits(code: &str, limits: Limits) -> Run {
        let mut variables = VariableStore::new();
        let lines = Lexer::new(code).tokenize();
        let program = Parser::new(lines, &mut variables).parse().expect("Should parse");
        let mut interp = Interpreter::new(variables, limits);
        let mut output = Transcript::new();
        let result = interp.execute(&program, &mut output);
        Run { output, result, lines_executed: interp.lines_executed() }
    }

    fn run_basic(code: &str) -> Result<String, BasicError> {
        let run = run_with_limits(code, Limits::default());
        run.result?;
        Ok(run.output.text())
    }

    #[test]
    fn test_print_then_end() {
        let run = run_with_limits("10 PRINT \"HI\"\n20 END", Limits::default());
        assert_eq!(run.output.text(), "HI");
        assert_eq!(run.result.expect("Should run"), ExecutionResult::Ended);
    }

    #[test]
    fn test_falls_off_the_end() {
        let run = run_with_limits("10 PRINT 1\n20 PRINT 2", Limits::default());
        assert_eq!(run.output.text(), "1\n2");
        assert_eq!(run.result.expect("Should run"), ExecutionResult::Completed);
    }

    #[test]
    fn test_variable_round_trip() {
        assert_eq!(run_basic("10 X%=5\n20 PRINT X").expect("Should run"), "5");
        assert_eq!(run_basic("10 Y$=HELLO\n20 PRINT Y").expect("Should run"), "HELLO");
        assert_eq!(run_basic("10 Y$=\"TWO WORDS\"\n20 PRINT Y").expect("Should run"), "TWO WORDS");
    }

    #[test]
    fn test_numeric_declaration_prints_normalized_value() {
        assert_eq!(run_basic("10 X%=007\n20 PRINT X").expect("Should run"), "7");
        assert_eq!(run_basic("10 X%=007\n20 IF X=7 THEN 40\n30 END\n40 PRINT \"SEVEN\"").expect("Should run"), "SEVEN");
        assert_eq!(run_basic("10 W$=INF\n20 PRINT W").expect("Should run"), "INF");
    }

    #[test]
    fn test_goto_undefined_line() {
        let err = run_basic("10 PRINT 1\n20 GOTO 99").unwrap_err();
        assert!(matches!(err, BasicError::UndefinedLine { line: 20, target: 99 }));
    }

    #[test]
    fn test_goto_resolves_by_number_not_position() {
        let output = run_basic("30 GOTO 5\n20 END\n5 PRINT \"FIVE\"\n7 GOTO 20").expect("Should run");
        assert_eq!(output, "FIVE");
    }

    #[test]
    fn test_if_jumps_when_true() {
        let code = "10 X%=5\n20 IF X=5 THEN 40\n30 PRINT \"NO\"\n40 PRINT \"YES\"";
        assert_eq!(run_basic(code).expect("Should run"), "YES");
    }

    #[test]
    fn test_if_falls_through_when_false() {
        let code = "10 X%=4\n20 IF X=5 THEN 40\n30 PRINT \"NO\"\n40 PRINT \"YES\"";
        assert_eq!(run_basic(code).expect("Should run"), "NO\nYES");
    }

    #[test]
    fn test_mutual_goto_stops_at_limit() {
        let run = run_with_limits("10 GOTO 20\n20 GOTO 10", Limits { max_lines: 7 });
        assert!(matches!(run.result, Err(BasicError::InfiniteLoop { limit: 7, .. })));
        assert_eq!(run.lines_executed, 7);

        let run = run_with_limits("10 GOTO 20\n20 GOTO 10", Limits::default());
        assert!(matches!(run.result, Err(BasicError::InfiniteLoop { limit: DEFAULT_MAX_LINES, .. })));
        assert_eq!(run.lines_executed, DEFAULT_MAX_LINES);
    }

    #[test]
    fn test_declaration_loop_hits_limit() {
        let run = run_with_limits("10 X%=1\n20 PRINT X\n30 GOTO 10", Limits::default());
        assert!(matches!(run.result, Err(BasicError::InfiniteLoop { .. })));
        // Line 20 is every third of the first 100 executions
        assert_eq!(run.output.output.len(), 33);
        assert!(run.output.output.iter().all(|line| line == "1"));
    }

    #[test]
    fn test_limit_equal_to_program_length_completes() {
        let run = run_with_limits("10 PRINT 1\n20 PRINT 2\n30 PRINT 3", Limits { max_lines: 3 });
        assert_eq!(run.result.expect("Should run"), ExecutionResult::Completed);
    }

    #[test]
    fn test_block_then_runs_nested_lines() {
        let code = "10 X%=1\n20 IF X=1 THEN\n30  PRINT \"A\"\n40  PRINT \"B\"\n50 PRINT \"C\"";
        assert_eq!(run_basic(code).expect("Should run"), "A\nB\nC");

        let code = "10 X%=2\n20 IF X=1 THEN\n30  PRINT \"A\"\n40  PRINT \"B\"\n50 PRINT \"C\"";
        assert_eq!(run_basic(code).expect("Should run"), "C");
    }

    #[test]
    fn test_block_then_jump_propagates() {
        let code = "10 IF 1=1 THEN\n20  GOTO 50\n30  PRINT \"IN\"\n40 PRINT \"SKIP\"\n50 PRINT \"DONE\"";
        assert_eq!(run_basic(code).expect("Should run"), "IN\nDONE");
    }

    #[test]
    fn test_end_inside_block() {
        let run = run_with_limits("10 IF 1=1 THEN\n20  END\n30 PRINT \"NO\"", Limits::default());
        assert_eq!(run.result.expect("Should run"), ExecutionResult::Ended);
        assert!(run.output.output.is_empty());
    }

    #[test]
    fn test_last_transfer_wins() {
        let code = "10 IF 1=1 THEN 30 GOTO 40\n20 PRINT \"A\"\n30 PRINT \"B\"\n40 PRINT \"C\"";
        assert_eq!(run_basic(code).expect("Should run"), "C");
    }

    #[test]
    fn test_cls_clears_display() {
        let run = run_with_limits("10 PRINT \"A\"\n20 CLS\n30 PRINT \"B\"", Limits::default());
        assert_eq!(run.output.output, vec!["B".to_string()]);
        assert_eq!(run.output.clears, 1);
    }

    #[test]
    fn test_declarations_use_parse_time_values() {
        // X%=2 on line 30 is applied before the program runs
        let code = "10 X%=1\n20 IF X=1 THEN 40\n30 X%=2\n40 PRINT X";
        assert_eq!(run_basic(code).expect("Should run"), "2");
    }

    #[test]
    fn test_runtime_undefined_variable() {
        let program = Program {
            lines: vec![LineRecord {
                number: 10,
                statements: vec![Stmt::Print(PrintArg::Variable("Z".to_string()))],
            }],
        };
        let mut interp = Interpreter::new(VariableStore::new(), Limits::default());
        let err = interp.execute(&program, &mut Transcript::new()).unwrap_err();
        assert!(matches!(err, BasicError::UndefinedVariable { line: 10, ref name } if name == "Z"));
    }

    #[test]
    fn test_condition_comparisons() {
        let mut vars = VariableStore::new();
        vars.declare(10, "X", Sigil::Number, "5").unwrap();
        vars.declare(20, "NAME", Sigil::Text, "BOB").unwrap();

        let holds = |text: &str| evaluate_condition(&vars, &Condition::parse(text).unwrap());

        assert!(holds("X=5"));
        assert!(holds("X<6"));
        assert!(holds("X>4"));
        assert!(!holds("X>5"));
        assert!(holds("NAME=BOB"));
        assert!(holds("APPLE<BANANA"));
        assert!(!holds("APPLE>BANANA"));
        // Mixed number/text never holds
        assert!(!holds("X=FIVE"));
        assert!(!holds("X<FIVE"));
        assert!(!holds("X>FIVE"));
    }

    #[test]
    fn test_state_after_run() {
        let mut variables = VariableStore::new();
        let lines = Lexer::new("10 A%=3\n20 PRINT A\n30 END").tokenize();
        let program = Parser::new(lines, &mut variables).parse().expect("Should parse");
        let mut interp = Interpreter::new(variables, Limits::default());
        interp.execute(&program, &mut Transcript::new()).expect("Should run");
        assert_eq!(interp.current_line(), Some(30));
        assert_eq!(interp.lines_executed(), 3);
        assert_eq!(interp.variables().get("A"), Some(&Value::Number(3)));
    }
}
