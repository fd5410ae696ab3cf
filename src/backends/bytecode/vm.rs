//! Operand-stack interpreter for finished function bodies.
//!
//! The interpreter trusts the body's stack discipline (bodies are verified
//! when they are completed) but checks every value against the type an
//! instruction expects, so a bad cast or an unassigned local becomes a
//! runtime error instead of a panic.

use crate::backends::bytecode::value::{NumArray, Scalar, Value};
use crate::backends::bytecode::{FunctionBody, Instruction, Label, LocalSlot};
use crate::backends::registry::HostFn;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};
use crate::return_runtime_error;

pub struct Interpreter<'a> {
    body: &'a FunctionBody,
    hosts: &'a [HostFn],
    max_steps: u64,

    stack: Vec<Value>,
    arguments: Vec<Value>,
    locals: Vec<Option<Value>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(body: &'a FunctionBody, hosts: &'a [HostFn], max_steps: u64) -> Self {
        Self {
            body,
            hosts,
            max_steps,
            stack: Vec::new(),
            arguments: Vec::new(),
            locals: vec![None; body.locals.len()],
        }
    }

    pub fn run(mut self, arguments: &[Value]) -> Result<Value, CompilerError> {
        let body = self.body;
        let signature = &body.signature;
        if arguments.len() != signature.inputs.len() {
            return_runtime_error!(
                "'{}' expects {} argument(s), got {}",
                signature.name,
                signature.inputs.len(),
                arguments.len()
            );
        }

        for (position, (argument, repr)) in arguments.iter().zip(&signature.inputs).enumerate() {
            if !argument.matches_repr(repr) {
                return_runtime_error!(
                    "Argument {} of '{}' must be {}, got {}",
                    position + 1,
                    signature.name,
                    repr,
                    argument.describe()
                );
            }
        }

        self.arguments = arguments.to_vec();

        let mut pc = 0usize;
        let mut steps = 0u64;

        loop {
            steps += 1;
            if steps > self.max_steps {
                return_runtime_error!(
                    "'{}' exceeded the step limit of {} (infinite loop?)",
                    signature.name,
                    self.max_steps
                );
            }

            let Some(instruction) = body.instructions.get(pc) else {
                return_runtime_error!("Control fell off the end of '{}'", signature.name);
            };
            pc += 1;

            match instruction {
                Instruction::LoadConstF64(value) => self.push(Scalar::Float64(*value)),
                Instruction::LoadConstF32(value) => self.push(Scalar::Float32(*value)),
                Instruction::LoadConstI32(value) => self.push(Scalar::Int32(*value)),
                Instruction::LoadConstI8(value) => self.push(Scalar::Int32(i32::from(*value))),
                Instruction::LoadConstBool(value) => self.push(Scalar::Logical(*value)),
                Instruction::LoadConstStr(value) => self.stack.push(Value::text(value)),

                Instruction::LoadArg(index) => {
                    let value = self.argument(*index)?.clone();
                    self.stack.push(value);
                }
                Instruction::StoreArg(index) => {
                    let value = self.pop()?;
                    let Some(slot) = self.arguments.get_mut(*index as usize) else {
                        return_runtime_error!("No argument {}", index);
                    };
                    *slot = value;
                }
                Instruction::LoadLocal(slot) => {
                    let value = self.local(*slot)?.clone();
                    self.stack.push(value);
                }
                Instruction::StoreLocal(slot) => {
                    let value = self.pop()?;
                    let Some(local) = self.locals.get_mut(slot.0 as usize) else {
                        return_runtime_error!("No local slot {}", slot.0);
                    };
                    *local = Some(value);
                }

                Instruction::Call { import, arity } => {
                    let arity = *arity as usize;
                    if self.stack.len() < arity {
                        return_runtime_error!("Operand stack underflow at call");
                    }
                    let call_arguments = self.stack.split_off(self.stack.len() - arity);
                    let Some(host) = self.hosts.get(import.0 as usize) else {
                        return_runtime_error!("Call to unbound import #{}", import.0);
                    };
                    let result = host(&call_arguments)?;
                    self.stack.push(result);
                }

                Instruction::BoxScalar(kind) => match self.pop()? {
                    Value::Scalar(scalar) if scalar.kind() == *kind => {
                        self.stack.push(Value::array(NumArray::from_scalar(scalar)))
                    }
                    other => return_runtime_error!(
                        "Cannot box {} as a {} array",
                        other.describe(),
                        kind
                    ),
                },
                Instruction::CloneValue => {
                    let value = self.pop()?;
                    self.stack.push(value.deep_clone());
                }
                Instruction::CheckedCast(repr) => {
                    let Some(value) = self.stack.last() else {
                        return_runtime_error!("Operand stack underflow at cast");
                    };
                    if !value.matches_repr(repr) {
                        return_runtime_error!(
                            "Invalid cast of {} to {}",
                            value.describe(),
                            repr
                        );
                    }
                }
                Instruction::LoadElement { kind, index_count } => {
                    let result = self.load_element(*kind, *index_count as usize)?;
                    self.stack.push(result);
                }

                Instruction::Truthy => {
                    let value = self.pop()?;
                    self.push(Scalar::Logical(value.is_truthy()));
                }
                Instruction::Branch(label) => pc = self.target(*label)?,
                Instruction::BranchIfTrue(label) => {
                    if self.pop_condition()? {
                        pc = self.target(*label)?;
                    }
                }
                Instruction::BranchIfFalse(label) => {
                    if !self.pop_condition()? {
                        pc = self.target(*label)?;
                    }
                }
                Instruction::Return => {
                    let value = self.pop()?;
                    if !value.matches_repr(&signature.output) {
                        return_runtime_error!(
                            "'{}' returned {}, declared {}",
                            signature.name,
                            value.describe(),
                            signature.output
                        );
                    }
                    return Ok(value);
                }

                Instruction::Add => self.binary(|a, b| a + b)?,
                Instruction::Sub => self.binary(|a, b| a - b)?,
                Instruction::Mul => self.binary(|a, b| a * b)?,
                Instruction::Div => self.binary(|a, b| a / b)?,
                Instruction::Neg => {
                    let operand = self.pop_scalar()?;
                    self.push(Scalar::from_f64(operand.kind(), -operand.to_f64()));
                }
                Instruction::CompareEq => self.compare(|a, b| a == b)?,
                Instruction::CompareLt => self.compare(|a, b| a < b)?,
                Instruction::CompareGt => self.compare(|a, b| a > b)?,

                Instruction::Dup => {
                    let Some(top) = self.stack.last().cloned() else {
                        return_runtime_error!("Operand stack underflow at dup");
                    };
                    self.stack.push(top);
                }
                Instruction::Pop => {
                    self.pop()?;
                }
            }
        }
    }

    fn push(&mut self, scalar: Scalar) {
        self.stack.push(Value::Scalar(scalar));
    }

    fn pop(&mut self) -> Result<Value, CompilerError> {
        match self.stack.pop() {
            Some(value) => Ok(value),
            None => return_runtime_error!(
                "Operand stack underflow in '{}'",
                self.body.signature.name
            ),
        }
    }

    fn pop_scalar(&mut self) -> Result<Scalar, CompilerError> {
        match self.pop()? {
            Value::Scalar(scalar) => Ok(scalar),
            other => return_runtime_error!("Expected a scalar operand, got {}", other.describe()),
        }
    }

    fn pop_condition(&mut self) -> Result<bool, CompilerError> {
        match self.pop_scalar()? {
            Scalar::Logical(value) => Ok(value),
            other => return_runtime_error!("Branch condition must be logical, got {}", other.kind()),
        }
    }

    fn argument(&self, index: u16) -> Result<&Value, CompilerError> {
        match self.arguments.get(index as usize) {
            Some(value) => Ok(value),
            None => return_runtime_error!("No argument {}", index),
        }
    }

    fn local(&self, slot: LocalSlot) -> Result<&Value, CompilerError> {
        match self.locals.get(slot.0 as usize) {
            Some(Some(value)) => Ok(value),
            Some(None) => {
                let name = match self.body.local_name(slot) {
                    Some(name) => format!("'{}'", name),
                    None => format!("slot {}", slot.0),
                };
                return_runtime_error!(
                    "Local {} read before it was assigned in '{}'",
                    name,
                    self.body.signature.name
                )
            }
            None => return_runtime_error!("No local slot {}", slot.0),
        }
    }

    fn target(&self, label: Label) -> Result<usize, CompilerError> {
        match self.body.label_offset(label) {
            Some(offset) => Ok(offset),
            None => return_runtime_error!("Branch to unresolved label L{}", label.0),
        }
    }

    /// Integer operands of one kind keep their kind (saturating), anything else is double.
    fn binary(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<(), CompilerError> {
        let right = self.pop_scalar()?;
        let left = self.pop_scalar()?;
        let kind = if left.kind() == right.kind() && left.kind().is_integer() {
            left.kind()
        } else {
            ElementKind::Float64
        };
        self.push(Scalar::from_f64(kind, op(left.to_f64(), right.to_f64())));
        Ok(())
    }

    fn compare(&mut self, op: impl Fn(f64, f64) -> bool) -> Result<(), CompilerError> {
        let right = self.pop_scalar()?;
        let left = self.pop_scalar()?;
        self.push(Scalar::Logical(op(left.to_f64(), right.to_f64())));
        Ok(())
    }

    fn load_element(&mut self, kind: ElementKind, index_count: usize) -> Result<Value, CompilerError> {
        let mut subscripts = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            let index = self.pop()?;
            subscripts.push(index_positions(&index)?);
        }
        subscripts.reverse();

        let subject = self.pop()?;
        if !subject.matches_repr(&Repr::Array(kind)) {
            return_runtime_error!(
                "Element read expects a {} array, got {}",
                kind,
                subject.describe()
            );
        }

        let Some(array) = subject.as_array() else {
            return_runtime_error!("Element read from a scalar");
        };
        let selected = array.borrow().select(&subscripts)?;
        Ok(Value::array(selected))
    }
}

/// Zero-based positions from a 1-based index array. Logical arrays act as masks.
fn index_positions(index: &Value) -> Result<Vec<usize>, CompilerError> {
    let Some(array) = index.as_array() else {
        return_runtime_error!("Index must be an array, got {}", index.describe());
    };
    let array = array.borrow();

    if array.kind() == ElementKind::Logical {
        return Ok(array
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, element)| element.is_nonzero())
            .map(|(position, _)| position)
            .collect());
    }

    let mut positions = Vec::with_capacity(array.len());
    for element in array.elements() {
        let raw = element.to_f64();
        if raw < 1.0 || raw.fract() != 0.0 {
            return_runtime_error!("Index {} is not a positive integer", raw);
        }
        positions.push(raw as usize - 1);
    }
    Ok(positions)
}
