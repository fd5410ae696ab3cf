use numlower::ir::ir_builder::{call, copy, if_else, index, literal, while_loop};
use numlower::ir::ir_nodes::Literal;
use numlower::{
    Assembly, AssemblyBuilder, CompilerError, ElementKind, ErrorType, FunctionDescriptor,
    FunctionTable, IrFunction, IrFunctionBuilder, LoweringConfig, NumArray, Repr, Value,
    lower_function, lower_functions_parallel,
};

const F64: Repr = Repr::Scalar(ElementKind::Float64);
const LOGICAL: Repr = Repr::Scalar(ElementKind::Logical);
const F64_ARRAY: Repr = Repr::Array(ElementKind::Float64);

/// total = sum(1:n); if total > limit { total = limit }
fn clamped_triangle() -> IrFunction {
    let mut f = IrFunctionBuilder::new("clamped_triangle");
    let n = f.input("n", F64);
    let limit = f.input("limit", F64);
    let total = f.output("total", F64);
    let one = f.local("one", F64);
    let range = f.local("range", F64_ARRAY);
    let over = f.local("over", LOGICAL);

    f.finish(vec![
        literal(one, Literal::Float64(1.0)),
        call(range, "colon", &[one, n]),
        call(total, "sum", &[range]),
        call(over, "gt", &[total, limit]),
        if_else(over, vec![copy(total, limit)], Vec::new()),
    ])
}

/// Product of the first `n` entries of `values`, one subscript at a time.
fn running_product() -> IrFunction {
    let mut f = IrFunctionBuilder::new("running_product");
    let values = f.input("values", F64_ARRAY);
    let n = f.input("n", F64);
    let product = f.output("product", F64);
    let i = f.local("i", F64);
    let one = f.local("one", F64);
    let keep_going = f.local("keep_going", LOGICAL);
    let picked = f.local("picked", F64_ARRAY);
    let element = f.local("element", F64);

    f.finish(vec![
        literal(product, Literal::Float64(1.0)),
        literal(one, Literal::Float64(1.0)),
        literal(i, Literal::Float64(1.0)),
        while_loop(
            vec![call(keep_going, "le", &[i, n])],
            keep_going,
            vec![
                index(picked, values, &[i]),
                call(element, "sum", &[picked]),
                call(product, "times", &[product, element]),
                call(i, "plus", &[i, one]),
            ],
        ),
    ])
}

fn row(values: &[f64]) -> Value {
    Value::array(NumArray::row(ElementKind::Float64, values))
}

#[test]
fn ephemeral_functions_run_immediately() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig::default();
    let mut target = numlower::EphemeralTarget::new(&config);

    let triangle = lower_function(&clamped_triangle(), &table, &mut target, &config).unwrap();
    assert_eq!(
        triangle
            .invoke(&[Value::from(4.0), Value::from(100.0)])
            .unwrap(),
        Value::from(10.0)
    );
    assert_eq!(
        triangle.invoke(&[Value::from(4.0), Value::from(6.0)]).unwrap(),
        Value::from(6.0)
    );

    let product = lower_function(&running_product(), &table, &mut target, &config).unwrap();
    assert_eq!(
        product
            .invoke(&[row(&[2.0, 3.0, 4.0]), Value::from(3.0)])
            .unwrap(),
        Value::from(24.0)
    );
    assert_eq!(
        product
            .invoke(&[row(&[2.0, 3.0, 4.0]), Value::from(0.0)])
            .unwrap(),
        Value::from(1.0)
    );
}

#[test]
fn wrong_arguments_are_runtime_errors() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig::default();
    let mut target = numlower::EphemeralTarget::new(&config);
    let product = lower_function(&running_product(), &table, &mut target, &config).unwrap();

    let error = product.invoke(&[Value::from(1.0)]).unwrap_err();
    assert_eq!(error.error_type, ErrorType::Runtime);

    // Reads past the end of the array
    let error = product
        .invoke(&[row(&[2.0]), Value::from(2.0)])
        .unwrap_err();
    assert_eq!(error.error_type, ErrorType::Runtime);
    assert_eq!(error.function.as_deref(), Some("running_product"));
}

#[test]
fn assemblies_survive_a_round_trip_through_disk() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig::default();

    let mut builder = AssemblyBuilder::from_config(&config);
    let triangle = lower_function(&clamped_triangle(), &table, &mut builder, &config).unwrap();
    let product = lower_function(&running_product(), &table, &mut builder, &config).unwrap();
    assert_eq!(triangle.name, "clamped_triangle");
    assert_ne!(triangle.index, product.index);

    let assembly = builder.seal();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numeric.nla");
    assembly.write_to(&path).unwrap();

    let reloaded = Assembly::read_from(&path).unwrap();
    assert_eq!(reloaded, assembly);
    assert_eq!(reloaded.member_names(), vec!["clamped_triangle", "running_product"]);

    let loaded = reloaded.bind(&table).unwrap();
    assert_eq!(
        loaded
            .invoke("clamped_triangle", &[Value::from(5.0), Value::from(12.0)])
            .unwrap(),
        Value::from(12.0)
    );

    let bound = loaded.member_at(&product).unwrap();
    assert_eq!(
        bound.invoke(&[row(&[1.5, 2.0]), Value::from(2.0)]).unwrap(),
        Value::from(3.0)
    );
}

#[test]
fn persisted_and_ephemeral_results_agree() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig::default();

    let mut builder = AssemblyBuilder::new("agree");
    lower_function(&running_product(), &table, &mut builder, &config).unwrap();
    let bytes = builder.seal().to_bytes().unwrap();
    let loaded = Assembly::from_bytes(&bytes).unwrap().bind(&table).unwrap();

    let mut target = numlower::EphemeralTarget::new(&config);
    let ephemeral = lower_function(&running_product(), &table, &mut target, &config).unwrap();

    for n in 0..4 {
        let arguments = [row(&[1.0, -2.0, 3.5, 0.5]), Value::from(n as f64)];
        assert_eq!(
            loaded.invoke("running_product", &arguments).unwrap(),
            ephemeral.invoke(&arguments).unwrap()
        );
    }
}

#[test]
fn binding_uses_the_table_it_is_given() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig::default();

    let mut builder = AssemblyBuilder::new("rebind");
    lower_function(&clamped_triangle(), &table, &mut builder, &config).unwrap();
    let assembly = builder.seal();

    // Members import `sum` by its float64 symbol
    let mut replaced = FunctionTable::with_standard_library();
    replaced.register(FunctionDescriptor::new(
        "sum:double",
        vec![F64_ARRAY],
        F64,
        |_: &[Value]| -> Result<Value, CompilerError> { Ok(Value::from(-1.0)) },
    ));

    let loaded = assembly.bind(&replaced).unwrap();
    assert_eq!(
        loaded
            .invoke("clamped_triangle", &[Value::from(4.0), Value::from(100.0)])
            .unwrap(),
        Value::from(-1.0)
    );

    let error = assembly.bind(&FunctionTable::new()).unwrap_err();
    assert!(matches!(error.error_type, ErrorType::FunctionNotFound { .. }));
}

#[test]
fn config_files_change_how_functions_lower() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(numlower::settings::CONFIG_FILE_NAME),
        "narrow_constants = false\nemit_debug_names = false\nassembly_name = \"quiet\"\n",
    )
    .unwrap();
    let config = LoweringConfig::load(dir.path()).unwrap();
    let table = FunctionTable::with_standard_library();

    let mut builder = AssemblyBuilder::from_config(&config);
    assert_eq!(builder.name(), "quiet");
    lower_function(&clamped_triangle(), &table, &mut builder, &config).unwrap();

    let assembly = builder.seal();
    let member = assembly.member("clamped_triangle").unwrap();
    assert!(member.locals.iter().all(|local| local.name.is_none()));
}

#[test]
fn batches_match_one_at_a_time_lowering() {
    let table = FunctionTable::with_standard_library();
    let config = LoweringConfig {
        parallel_threshold: 1,
        ..LoweringConfig::default()
    };

    let functions: Vec<IrFunction> = (0..8)
        .map(|n| {
            if n % 2 == 0 {
                clamped_triangle()
            } else {
                running_product()
            }
        })
        .collect();

    let results = lower_functions_parallel(&functions, &table, &config);
    assert_eq!(results.len(), functions.len());

    for (function, result) in functions.iter().zip(results) {
        let compiled = result.unwrap();
        assert_eq!(compiled.name(), function.name);
    }
}
