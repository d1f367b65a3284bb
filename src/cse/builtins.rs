//! Built-in functions of the primitive environment.
//!
//! Every built-in is unary at the machine level; `Conc` curries by returning
//! a partial value that awaits the second string.

use std::io::Write;

use super::value::Value;
use super::CseError;

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Stem,
    Stern,
    Conc,
    Order,
    Null,
    Isinteger,
    Istruthvalue,
    Isstring,
    Istuple,
    Isfunction,
    Isdummy,
    ItoS,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Print,
        Builtin::Stem,
        Builtin::Stern,
        Builtin::Conc,
        Builtin::Order,
        Builtin::Null,
        Builtin::Isinteger,
        Builtin::Istruthvalue,
        Builtin::Isstring,
        Builtin::Istuple,
        Builtin::Isfunction,
        Builtin::Isdummy,
        Builtin::ItoS,
    ];

    /// The name this built-in is bound to in the primitive environment.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "Print",
            Builtin::Stem => "Stem",
            Builtin::Stern => "Stern",
            Builtin::Conc => "Conc",
            Builtin::Order => "Order",
            Builtin::Null => "Null",
            Builtin::Isinteger => "Isinteger",
            Builtin::Istruthvalue => "Istruthvalue",
            Builtin::Isstring => "Isstring",
            Builtin::Istuple => "Istuple",
            Builtin::Isfunction => "Isfunction",
            Builtin::Isdummy => "Isdummy",
            Builtin::ItoS => "ItoS",
        }
    }

    /// Apply this built-in to one argument.
    pub fn apply(self, arg: Value, out: &mut dyn Write) -> Result<Value, CseError> {
        match self {
            Builtin::Print => {
                let _ = write!(out, "{arg}");
                Ok(Value::Dummy)
            }
            Builtin::Stem => match arg {
                Value::Str(s) => Ok(Value::Str(s.chars().take(1).collect())),
                other => Err(self.type_error(&other)),
            },
            Builtin::Stern => match arg {
                Value::Str(s) => Ok(Value::Str(s.chars().skip(1).collect())),
                other => Err(self.type_error(&other)),
            },
            Builtin::Conc => match arg {
                Value::Str(s) => Ok(Value::ConcPartial(s)),
                other => Err(self.type_error(&other)),
            },
            Builtin::Order => match arg {
                Value::Tuple(items) => Ok(Value::Integer(items.len() as i64)),
                Value::Nil => Ok(Value::Integer(0)),
                other => Err(self.type_error(&other)),
            },
            Builtin::Null => match arg {
                Value::Nil => Ok(Value::Bool(true)),
                Value::Tuple(items) => Ok(Value::Bool(items.is_empty())),
                other => Err(self.type_error(&other)),
            },
            Builtin::Isinteger => Ok(Value::Bool(matches!(arg, Value::Integer(_)))),
            Builtin::Istruthvalue => Ok(Value::Bool(matches!(arg, Value::Bool(_)))),
            Builtin::Isstring => Ok(Value::Bool(matches!(arg, Value::Str(_)))),
            Builtin::Istuple => Ok(Value::Bool(matches!(arg, Value::Tuple(_) | Value::Nil))),
            Builtin::Isfunction => Ok(Value::Bool(matches!(
                arg,
                Value::Closure(_)
                    | Value::Eta(_)
                    | Value::Ystar
                    | Value::Builtin(_)
                    | Value::ConcPartial(_)
            ))),
            Builtin::Isdummy => Ok(Value::Bool(matches!(arg, Value::Dummy))),
            Builtin::ItoS => match arg {
                Value::Integer(n) => Ok(Value::Str(n.to_string())),
                other => Err(self.type_error(&other)),
            },
        }
    }

    fn type_error(self, arg: &Value) -> CseError {
        let wanted = match self {
            Builtin::Stem | Builtin::Stern | Builtin::Conc => "a string",
            Builtin::Order | Builtin::Null => "a tuple",
            Builtin::ItoS => "an integer",
            _ => "a different argument",
        };
        CseError::TypeError(format!(
            "{}: expected {wanted}, found {}",
            self.name(),
            arg.kind_name()
        ))
    }
}
