use crate::ir::ir_builder::{IrFunctionBuilder, call, literal};
use crate::ir::ir_nodes::{Literal, VarId, VarKind};
use crate::ir::repr::{ElementKind, Repr};

const F64: Repr = Repr::Scalar(ElementKind::Float64);

#[test]
fn builder_assigns_dense_ids_in_declaration_order() {
    let mut builder = IrFunctionBuilder::new("f");
    let x = builder.input("x", F64);
    let y = builder.output("y", F64);
    let t = builder.local("t", Repr::Array(ElementKind::Int32));

    assert_eq!((x, y, t), (VarId(0), VarId(1), VarId(2)));

    let function = builder.finish(vec![call(t, "plus", &[x, x]), literal(y, Literal::Float64(1.0))]);
    assert_eq!(function.inputs, vec![x]);
    assert_eq!(function.outputs, vec![y]);

    let t_var = function.variable(t).unwrap();
    assert_eq!(t_var.kind, VarKind::Local);
    assert_eq!(t_var.name, "t");
    assert_eq!(function.input_reprs(), vec![F64]);
    assert!(function.variable(VarId(9)).is_none());
}

#[test]
fn literal_natural_reprs() {
    assert_eq!(Literal::Float64(2.5).natural_repr(), F64);
    assert_eq!(Literal::Int32(3).natural_repr(), Repr::Scalar(ElementKind::Int32));
    assert_eq!(Literal::Logical(true).natural_repr(), Repr::Scalar(ElementKind::Logical));
    assert_eq!(
        Literal::Text("abc".into()).natural_repr(),
        Repr::Array(ElementKind::Char)
    );
}

#[test]
fn repr_classification() {
    assert!(!F64.is_reference_carrying());
    assert!(Repr::Array(ElementKind::Float64).is_reference_carrying());
    assert!(Repr::Any.is_reference_carrying());

    assert_eq!(F64.array_form(), Some(Repr::Array(ElementKind::Float64)));
    assert_eq!(Repr::Any.array_form(), None);
    assert_eq!(Repr::Any.element_kind(), None);
}

#[test]
fn complex_counterparts_only_exist_for_floats() {
    for kind in ElementKind::NUMERIC {
        match kind {
            ElementKind::Float32 => assert_eq!(kind.complex_counterpart(), Some(ElementKind::Complex32)),
            ElementKind::Float64 => assert_eq!(kind.complex_counterpart(), Some(ElementKind::Complex64)),
            _ => assert_eq!(kind.complex_counterpart(), None),
        }
    }

    assert_eq!(ElementKind::Complex64.real_counterpart(), Some(ElementKind::Float64));
    assert_eq!(ElementKind::NUMERIC.last(), Some(&ElementKind::Float64));
}

#[test]
fn repr_display() {
    assert_eq!(F64.to_string(), "double");
    assert_eq!(Repr::Array(ElementKind::Int8).to_string(), "int8[]");
    assert_eq!(Repr::Any.to_string(), "any");
}
