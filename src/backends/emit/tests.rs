use crate::backends::bytecode::value::Value;
use crate::backends::bytecode::{FunctionSignature, Instruction, LocalSlot};
use crate::backends::emit::assembly::{Assembly, AssemblyBuilder};
use crate::backends::emit::ephemeral::EphemeralTarget;
use crate::backends::emit::{EmissionTarget, FunctionBuilder, InstructionSink};
use crate::backends::registry::FunctionTable;
use crate::compiler_messages::compiler_errors::ErrorType;
use crate::ir::repr::{ElementKind, Repr};

const F64: Repr = Repr::Scalar(ElementKind::Float64);

fn signature(name: &str) -> FunctionSignature {
    FunctionSignature {
        name: name.to_owned(),
        inputs: vec![F64],
        output: F64,
    }
}

/// `name(x) = x + 1`, written straight into a sink.
fn emit_increment<S: InstructionSink>(sink: &mut S, table: &FunctionTable) -> LocalSlot {
    let plus = table.lookup_arity("plus", 2).unwrap();
    let import = sink.import_function(plus).unwrap();
    let result = sink.declare_local(F64).unwrap();
    sink.name_local(result, "result");

    sink.emit(Instruction::LoadArg(0));
    sink.emit(Instruction::LoadConstF64(1.0));
    sink.emit(Instruction::Call { import, arity: 2 });
    sink.emit(Instruction::StoreLocal(result));
    sink.emit(Instruction::LoadLocal(result));
    sink.emit(Instruction::Return);
    result
}

#[test]
fn ephemeral_functions_are_invocable_and_drop_names() {
    let table = FunctionTable::with_standard_library();
    let mut target = EphemeralTarget::default();

    let mut sink = target.begin_function(signature("inc")).unwrap();
    assert!(!sink.supports_debug_names());
    let slot = emit_increment(&mut sink, &table);

    let function = target.complete_function(sink).unwrap();
    assert_eq!(function.invoke(&[Value::from(2.0)]).unwrap(), Value::from(3.0));
    assert_eq!(function.body().local_name(slot), None);
}

#[test]
fn imports_are_shared_per_symbol() {
    let table = FunctionTable::with_standard_library();
    let plus = table.lookup_arity("plus", 2).unwrap();
    let minus = table.lookup_arity("minus", 2).unwrap();

    let mut builder = FunctionBuilder::new(signature("f"), false);
    let first = builder.import_function(plus).unwrap();
    let second = builder.import_function(minus).unwrap();
    let again = builder.import_function(plus).unwrap();

    assert_eq!(first, again);
    assert_ne!(first, second);
}

#[test]
fn labels_must_be_marked_exactly_once() {
    let mut builder = FunctionBuilder::new(signature("f"), false);
    let label = builder.define_label();
    builder.mark_label(label).unwrap();

    let error = builder.mark_label(label).unwrap_err();
    assert_eq!(error.error_type, ErrorType::InternalContractViolation);

    let mut unmarked = FunctionBuilder::new(signature("g"), false);
    unmarked.define_label();
    unmarked.emit(Instruction::LoadArg(0));
    unmarked.emit(Instruction::Return);
    let Err(error) = unmarked.finish() else {
        panic!("an unmarked label should fail the body");
    };
    assert_eq!(error.error_type, ErrorType::InternalContractViolation);
}

#[test]
fn finishing_checks_the_stack_discipline() {
    let mut builder = FunctionBuilder::new(signature("f"), false);
    builder.emit(Instruction::Return);
    assert!(builder.finish().is_err());
}

#[test]
fn assembly_members_keep_debug_names() {
    let table = FunctionTable::with_standard_library();
    let mut assembly = AssemblyBuilder::new("lib");

    let mut sink = assembly.begin_function(signature("inc")).unwrap();
    assert!(sink.supports_debug_names());
    let slot = emit_increment(&mut sink, &table);
    let handle = assembly.complete_function(sink).unwrap();

    assert_eq!(handle.index, 0);
    assert_eq!(handle.name, "inc");

    let sealed = assembly.seal();
    assert_eq!(sealed.member_names(), vec!["inc"]);
    assert_eq!(sealed.member("inc").unwrap().local_name(slot), Some("result"));
}

#[test]
fn duplicate_member_names_are_rejected() {
    let table = FunctionTable::with_standard_library();
    let mut assembly = AssemblyBuilder::new("lib");

    let mut first = assembly.begin_function(signature("inc")).unwrap();
    let mut second = assembly.begin_function(signature("inc")).unwrap();
    emit_increment(&mut first, &table);
    emit_increment(&mut second, &table);

    assembly.complete_function(first).unwrap();
    let error = assembly.complete_function(second).unwrap_err();
    assert_eq!(error.error_type, ErrorType::Emission);

    let Err(error) = assembly.begin_function(signature("inc")) else {
        panic!("a taken member name should not open a sink");
    };
    assert_eq!(error.error_type, ErrorType::Emission);
    assert_eq!(assembly.len(), 1);
}

#[test]
fn dropped_sinks_leave_nothing_behind() {
    let mut assembly = AssemblyBuilder::new("lib");
    let sink = assembly.begin_function(signature("abandoned")).unwrap();
    drop(sink);

    assert!(assembly.is_empty());
    assert!(assembly.seal().members.is_empty());
}

#[test]
fn sealed_assemblies_round_trip_and_bind() {
    let table = FunctionTable::with_standard_library();
    let mut assembly = AssemblyBuilder::new("lib");
    let mut sink = assembly.begin_function(signature("inc")).unwrap();
    emit_increment(&mut sink, &table);
    let handle = assembly.complete_function(sink).unwrap();
    let sealed = assembly.seal();

    let restored = Assembly::from_bytes(&sealed.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, sealed);

    let loaded = restored.bind(&table).unwrap();
    assert_eq!(
        loaded.invoke("inc", &[Value::from(41.0)]).unwrap(),
        Value::from(42.0)
    );
    assert!(loaded.member_at(&handle).is_some());

    let missing = loaded.invoke("dec", &[Value::from(1.0)]).unwrap_err();
    assert_eq!(missing.error_type, ErrorType::Emission);
}

#[test]
fn binding_needs_every_import_symbol() {
    let table = FunctionTable::with_standard_library();
    let mut assembly = AssemblyBuilder::new("lib");
    let mut sink = assembly.begin_function(signature("inc")).unwrap();
    emit_increment(&mut sink, &table);
    assembly.complete_function(sink).unwrap();
    let sealed = assembly.seal();

    let error = sealed.bind(&FunctionTable::new()).unwrap_err();
    assert_eq!(
        error.error_type,
        ErrorType::FunctionNotFound {
            name: "plus".to_owned(),
            arity: 2
        }
    );
    assert_eq!(error.function.as_deref(), Some("inc"));
}

#[test]
fn malformed_or_foreign_bytes_are_rejected() {
    assert!(Assembly::from_bytes(b"not json").is_err());

    let future = Assembly {
        format_version: 99,
        name: "lib".to_owned(),
        members: Vec::new(),
    };
    let error = Assembly::from_bytes(&future.to_bytes().unwrap()).unwrap_err();
    assert_eq!(error.error_type, ErrorType::Emission);
}
