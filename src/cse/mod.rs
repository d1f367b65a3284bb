//! # The CSE machine
//!
//! A small-step evaluator over the compiled control structure: a **Control**
//! sequence being consumed from the right, a value **Stack** being produced,
//! and a current **Environment**. Environment markers carry a shared numeric
//! identity on both sequences and delimit the lifetime of a scope.
//!
//! The thirteen rules, in terms of the item popped off Control:
//!
//! 1. a name resolves in the current environment
//! 2. a lambda token becomes a closure over the current environment
//! 3. `gamma` with a closure rator enters a fresh environment binding the
//!    formals to the rand
//! 4. `gamma` with a built-in rator applies it eagerly
//! 5. an environment marker matches its stack marker and restores the
//!    previous environment
//! 6. / 7. operators pop their operands and push the result
//! 8. `beta` selects one conditional arm by the stacked boolean
//! 9. `tau n` forms a tuple from n stacked values
//! 10. `gamma` with a tuple rator selects a 1-indexed element
//! 11. a tuple-pattern closure destructures its tuple rand
//! 12. `gamma` applying `Y*` to a closure yields an η-closure
//! 13. `gamma` applying an η-closure re-applies the underlying closure with
//!     the η-closure as the recursive reference

pub mod builtins;
pub mod control;
pub mod env;
pub mod value;

pub use builtins::Builtin;
pub use control::{build, BinOp, ControlItem, ControlStructure, Delta, UnOp};
pub use env::{EnvRef, Environment};
pub use value::{Closure, Value};

use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Evaluation failure. All runtime errors are fatal; there is no user-level
/// exception mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CseError {
    UnboundIdentifier(String),
    TypeError(String),
    TupleIndexOutOfRange { index: i64, len: usize },
    ArityMismatch { expected: usize, found: usize },
    DivisionByZero,
}

impl fmt::Display for CseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CseError::UnboundIdentifier(name) => {
                write!(f, "Runtime error: unbound identifier '{}'", name)
            }
            CseError::TypeError(msg) => write!(f, "Runtime error: {}", msg),
            CseError::TupleIndexOutOfRange { index, len } => write!(
                f,
                "Runtime error: tuple index {} out of range for a tuple of order {}",
                index, len
            ),
            CseError::ArityMismatch { expected, found } => write!(
                f,
                "Runtime error: function binds {} names but was applied to a tuple of order {}",
                expected, found
            ),
            CseError::DivisionByZero => write!(f, "Runtime error: division by zero"),
        }
    }
}

impl std::error::Error for CseError {}

/// An item on the Control sequence.
enum Ctrl {
    Item(ControlItem),
    EnvMarker(usize),
}

/// An item on the value Stack.
enum StackItem {
    Value(Value),
    EnvMarker(usize),
}

/// Evaluate a compiled program. `Print` output goes to `out`; the final
/// stack value is returned.
pub fn evaluate(structure: &ControlStructure, out: &mut dyn Write) -> Result<Value, CseError> {
    CseMachine::new(structure, out).run()
}

struct CseMachine<'a> {
    structure: &'a ControlStructure,
    control: Vec<Ctrl>,
    stack: Vec<StackItem>,
    /// Active environments, innermost last; entries pair the marker identity
    /// with the environment it opened.
    envs: Vec<(usize, EnvRef)>,
    next_marker: usize,
    out: &'a mut dyn Write,
}

impl<'a> CseMachine<'a> {
    fn new(structure: &'a ControlStructure, out: &'a mut dyn Write) -> Self {
        let root = structure.root();
        let mut machine = CseMachine {
            structure,
            control: Vec::new(),
            stack: Vec::new(),
            envs: vec![(0, Rc::clone(&root.defining_env))],
            next_marker: 1,
            out,
        };
        machine.control.push(Ctrl::EnvMarker(0));
        machine.load_body(root);
        machine.stack.push(StackItem::EnvMarker(0));
        machine
    }

    fn run(mut self) -> Result<Value, CseError> {
        while let Some(item) = self.control.pop() {
            match item {
                Ctrl::EnvMarker(id) => self.exit_env(id)?,
                Ctrl::Item(ControlItem::Name(name)) => {
                    let value = self
                        .current_env()
                        .borrow()
                        .lookup(&name)
                        .ok_or(CseError::UnboundIdentifier(name))?;
                    self.push(value);
                }
                Ctrl::Item(ControlItem::Integer(n)) => self.push(Value::Integer(n)),
                Ctrl::Item(ControlItem::Str(s)) => self.push(Value::Str(s)),
                Ctrl::Item(ControlItem::True) => self.push(Value::Bool(true)),
                Ctrl::Item(ControlItem::False) => self.push(Value::Bool(false)),
                Ctrl::Item(ControlItem::Nil) => self.push(Value::Nil),
                Ctrl::Item(ControlItem::Dummy) => self.push(Value::Dummy),
                Ctrl::Item(ControlItem::Ystar) => self.push(Value::Ystar),
                Ctrl::Item(ControlItem::Lambda(index)) => {
                    let var = self.delta(index).bound_vars.first().cloned().unwrap_or_default();
                    let env = Rc::clone(self.current_env());
                    self.push(Value::Closure(Closure {
                        delta: index,
                        env,
                        var,
                    }));
                }
                Ctrl::Item(ControlItem::Gamma) => self.apply()?,
                Ctrl::Item(ControlItem::BinOp(op)) => self.binary(op)?,
                Ctrl::Item(ControlItem::UnOp(op)) => self.unary(op)?,
                Ctrl::Item(ControlItem::Beta { then_arm, else_arm }) => {
                    let arm = match self.pop_value()? {
                        Value::Bool(true) => then_arm,
                        Value::Bool(false) => else_arm,
                        other => {
                            return Err(CseError::TypeError(format!(
                                "conditional guard must be a truthvalue, found {}",
                                other.kind_name()
                            )))
                        }
                    };
                    let arm = self.delta(arm);
                    self.load_body(arm);
                }
                Ctrl::Item(ControlItem::Tau(n)) => {
                    let mut items = Vec::with_capacity(n);
                    for _ in 0..n {
                        items.push(self.pop_value()?);
                    }
                    self.push(Value::Tuple(items));
                }
            }
        }

        // Control drained: the stack holds exactly the program's value.
        match self.stack.pop() {
            Some(StackItem::Value(result)) if self.stack.is_empty() => Ok(result),
            _ => Err(CseError::TypeError(
                "machine halted with a malformed stack".into(),
            )),
        }
    }

    /// Queue a delta body onto Control. The body is stored in pre-order, so
    /// appending it leaves the *last* pre-order token on top: operands
    /// evaluate before their operator, right operands before left.
    fn load_body(&mut self, delta: &Delta) {
        self.control
            .extend(delta.body.iter().cloned().map(Ctrl::Item));
    }

    /// The referenced delta, borrowed for the machine's full lifetime so it
    /// can be held across mutations of the machine state.
    fn delta(&self, index: usize) -> &'a Delta {
        &self.structure.deltas[index]
    }

    fn current_env(&self) -> &EnvRef {
        // there is always at least the δ₀ environment
        &self.envs.last().expect("no active environment").1
    }

    fn push(&mut self, value: Value) {
        self.stack.push(StackItem::Value(value));
    }

    fn pop_value(&mut self) -> Result<Value, CseError> {
        match self.stack.pop() {
            Some(StackItem::Value(value)) => Ok(value),
            _ => Err(CseError::TypeError(
                "expected a value on the machine stack".into(),
            )),
        }
    }

    /// Rule 5: leave a scope, keeping its single result value.
    fn exit_env(&mut self, id: usize) -> Result<(), CseError> {
        let result = self.pop_value()?;
        match self.stack.pop() {
            Some(StackItem::EnvMarker(stack_id)) if stack_id == id => {}
            _ => {
                return Err(CseError::TypeError(
                    "environment markers out of sync".into(),
                ))
            }
        }
        self.envs.pop();
        self.stack.push(StackItem::Value(result));
        Ok(())
    }

    /// Rules 3, 4, 10, 11, 12 and 13: apply the rator to the rand.
    fn apply(&mut self) -> Result<(), CseError> {
        let rator = self.pop_value()?;
        let rand = self.pop_value()?;
        match rator {
            Value::Closure(closure) => self.enter(closure, rand),
            Value::Builtin(builtin) => {
                let result = builtin.apply(rand, self.out)?;
                self.push(result);
                Ok(())
            }
            Value::ConcPartial(first) => match rand {
                Value::Str(second) => {
                    self.push(Value::Str(first + &second));
                    Ok(())
                }
                other => Err(CseError::TypeError(format!(
                    "Conc: expected a string, found {}",
                    other.kind_name()
                ))),
            },
            Value::Tuple(items) => match rand {
                Value::Integer(index) => {
                    if index < 1 || index as usize > items.len() {
                        return Err(CseError::TupleIndexOutOfRange {
                            index,
                            len: items.len(),
                        });
                    }
                    let mut items = items;
                    self.push(items.swap_remove(index as usize - 1));
                    Ok(())
                }
                other => Err(CseError::TypeError(format!(
                    "tuple selection needs an integer, found {}",
                    other.kind_name()
                ))),
            },
            Value::Ystar => match rand {
                Value::Closure(closure) => {
                    self.push(Value::Eta(closure));
                    Ok(())
                }
                other => Err(CseError::TypeError(format!(
                    "Y* must be applied to a function, found {}",
                    other.kind_name()
                ))),
            },
            Value::Eta(closure) => {
                // F (Y F) rand: restore the rand, re-stack the η-closure as
                // the recursive reference, and apply twice.
                self.push(rand);
                self.push(Value::Eta(closure.clone()));
                self.push(Value::Closure(closure));
                self.control.push(Ctrl::Item(ControlItem::Gamma));
                self.control.push(Ctrl::Item(ControlItem::Gamma));
                Ok(())
            }
            other => Err(CseError::TypeError(format!(
                "cannot apply a {} as a function",
                other.kind_name()
            ))),
        }
    }

    /// Rules 3 and 11: enter a closure, binding its formals to the rand.
    fn enter(&mut self, closure: Closure, rand: Value) -> Result<(), CseError> {
        let delta = self.delta(closure.delta);
        let env = Environment::child_of(&closure.env);

        match delta.bound_vars.as_slice() {
            [] => {
                return Err(CseError::TypeError(
                    "closure without bound variables".into(),
                ))
            }
            [name] => env.borrow_mut().define(name.as_str(), rand),
            names => match rand {
                Value::Tuple(items) => {
                    if items.len() != names.len() {
                        return Err(CseError::ArityMismatch {
                            expected: names.len(),
                            found: items.len(),
                        });
                    }
                    let mut env = env.borrow_mut();
                    for (name, item) in names.iter().zip(items) {
                        env.define(name.as_str(), item);
                    }
                }
                other => {
                    return Err(CseError::TypeError(format!(
                        "tuple-pattern function needs a tuple argument, found {}",
                        other.kind_name()
                    )))
                }
            },
        }

        let id = self.next_marker;
        self.next_marker += 1;
        self.envs.push((id, env));
        self.stack.push(StackItem::EnvMarker(id));
        self.control.push(Ctrl::EnvMarker(id));
        self.load_body(delta);
        Ok(())
    }

    /// Rule 6: binary operators. The left operand is popped first.
    fn binary(&mut self, op: BinOp) -> Result<(), CseError> {
        let left = self.pop_value()?;
        let right = self.pop_value()?;
        let result = match op {
            BinOp::Plus | BinOp::Minus | BinOp::Mult | BinOp::Div | BinOp::Exp => {
                let (a, b) = int_operands(op, left, right)?;
                Value::Integer(match op {
                    BinOp::Plus => a + b,
                    BinOp::Minus => a - b,
                    BinOp::Mult => a * b,
                    BinOp::Div => {
                        if b == 0 {
                            return Err(CseError::DivisionByZero);
                        }
                        a / b
                    }
                    BinOp::Exp => {
                        if b < 0 {
                            return Err(CseError::TypeError(
                                "'**' needs a non-negative exponent".into(),
                            ));
                        }
                        let exponent = u32::try_from(b).map_err(|_| {
                            CseError::TypeError("'**' exponent too large".into())
                        })?;
                        a.checked_pow(exponent).ok_or_else(|| {
                            CseError::TypeError("integer overflow in '**'".into())
                        })?
                    }
                    _ => unreachable!(),
                })
            }
            BinOp::Gr | BinOp::Ge | BinOp::Ls | BinOp::Le => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => Value::Bool(compare(op, &a, &b)),
                (Value::Str(a), Value::Str(b)) => Value::Bool(compare(op, &a, &b)),
                (a, b) => {
                    return Err(CseError::TypeError(format!(
                        "'{}' needs two integers or two strings, found {} and {}",
                        op.symbol(),
                        a.kind_name(),
                        b.kind_name()
                    )))
                }
            },
            BinOp::Eq | BinOp::Ne => {
                let equal = match (&left, &right) {
                    (Value::Integer(a), Value::Integer(b)) => a == b,
                    (Value::Str(a), Value::Str(b)) => a == b,
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    (a, b) => {
                        return Err(CseError::TypeError(format!(
                            "'{}' cannot compare {} with {}",
                            op.symbol(),
                            a.kind_name(),
                            b.kind_name()
                        )))
                    }
                };
                Value::Bool(if op == BinOp::Eq { equal } else { !equal })
            }
            BinOp::Or | BinOp::And => match (left, right) {
                (Value::Bool(a), Value::Bool(b)) => {
                    Value::Bool(if op == BinOp::Or { a || b } else { a && b })
                }
                (a, b) => {
                    return Err(CseError::TypeError(format!(
                        "'{}' needs two truthvalues, found {} and {}",
                        op.symbol(),
                        a.kind_name(),
                        b.kind_name()
                    )))
                }
            },
            BinOp::Aug => match left {
                Value::Tuple(mut items) => {
                    items.push(right);
                    Value::Tuple(items)
                }
                Value::Nil => Value::Tuple(vec![right]),
                other => {
                    return Err(CseError::TypeError(format!(
                        "'aug' needs a tuple or nil, found {}",
                        other.kind_name()
                    )))
                }
            },
        };
        self.push(result);
        Ok(())
    }

    /// Rule 7: unary operators.
    fn unary(&mut self, op: UnOp) -> Result<(), CseError> {
        let operand = self.pop_value()?;
        let result = match (op, operand) {
            (UnOp::Not, Value::Bool(b)) => Value::Bool(!b),
            (UnOp::Neg, Value::Integer(n)) => Value::Integer(-n),
            (op, other) => {
                return Err(CseError::TypeError(format!(
                    "'{}' cannot be applied to a {}",
                    op.symbol(),
                    other.kind_name()
                )))
            }
        };
        self.push(result);
        Ok(())
    }
}

fn int_operands(op: BinOp, left: Value, right: Value) -> Result<(i64, i64), CseError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok((a, b)),
        (a, b) => Err(CseError::TypeError(format!(
            "'{}' needs two integers, found {} and {}",
            op.symbol(),
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

fn compare<T: PartialOrd>(op: BinOp, a: &T, b: &T) -> bool {
    match op {
        BinOp::Gr => a > b,
        BinOp::Ge => a >= b,
        BinOp::Ls => a < b,
        BinOp::Le => a <= b,
        _ => unreachable!(),
    }
}
