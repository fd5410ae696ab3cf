//! # Function Table
//!
//! Maps `(name, input arity)` to the host function a static call resolves to.
//!
//! - Resolution looks at the argument count only, never at argument types.
//! - Registering the same `(name, arity)` twice keeps the second descriptor.
//! - Generic builtins are expanded into one concrete descriptor per numeric
//!   element kind (plus complex counterparts where declared), each reachable
//!   through its kind-qualified name such as `abs:int32`. The plain name
//!   resolves to the double instantiation.
//!
//! The table is built once and then only read. Lowering borrows it shared,
//! so any number of passes can consult it at the same time.


use crate::backends::builtins::{ArithmeticBuiltins, ArrayBuiltins, GenericBuiltins};
use crate::backends::bytecode::ImportRef;
use crate::backends::bytecode::value::Value;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};
use crate::registry_log;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A host level function callable from compiled code.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, CompilerError> + Send + Sync>;

// The kind generic builtins resolve to when called by their plain name
pub const DEFAULT_ELEMENT_KIND: ElementKind = ElementKind::Float64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub name: String,
    pub arity: usize,
}

impl FunctionKey {
    pub fn new(name: &str, arity: usize) -> Self {
        Self {
            name: name.to_owned(),
            arity,
        }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

// ======================================================
//                 FUNCTION DESCRIPTORS
// ======================================================
#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: String,

    // Unique across the table, used to rebind persisted imports
    pub symbol: String,

    pub inputs: Vec<Repr>,
    pub output: Repr,
    pub host: HostFn,
}

impl FunctionDescriptor {
    pub fn new(
        name: &str,
        inputs: Vec<Repr>,
        output: Repr,
        host: impl Fn(&[Value]) -> Result<Value, CompilerError> + Send + Sync + 'static,
    ) -> Self {
        Self::from_host(name, inputs, output, Arc::new(host))
    }

    pub fn from_host(name: &str, inputs: Vec<Repr>, output: Repr, host: HostFn) -> Self {
        let symbol = format!("{}/{}", name, inputs.len());
        Self {
            name: name.to_owned(),
            symbol,
            inputs,
            output,
            host,
        }
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn key(&self) -> FunctionKey {
        FunctionKey::new(&self.name, self.arity())
    }

    pub fn import_ref(&self) -> ImportRef {
        ImportRef {
            symbol: self.symbol.clone(),
            inputs: self.inputs.clone(),
            output: self.output,
        }
    }

    /// The same function under another name, keeping its symbol.
    fn aliased(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

// ======================================================
//                   BUILTIN PROVIDERS
// ======================================================

/// Signature and body of one concrete instantiation of a generic builtin.
pub struct Instantiation {
    pub inputs: Vec<Repr>,
    pub output: Repr,
    pub host: HostFn,
}

/// A builtin written once over "any numeric element kind".
#[derive(Clone, Copy)]
pub struct GenericBuiltin {
    pub name: &'static str,

    // Also instantiate for the complex counterpart of each kind that has one
    pub supports_complex: bool,

    pub instantiate: fn(ElementKind) -> Instantiation,
}

impl GenericBuiltin {
    /// One descriptor per numeric kind, then the complex counterparts.
    /// Names are qualified with the element kind, e.g. `abs:int32`.
    pub fn expand(&self) -> Vec<(ElementKind, FunctionDescriptor)> {
        let mut kinds: Vec<ElementKind> = ElementKind::NUMERIC.to_vec();
        if self.supports_complex {
            kinds.extend(
                ElementKind::NUMERIC
                    .iter()
                    .filter_map(ElementKind::complex_counterpart),
            );
        }

        kinds
            .into_iter()
            .map(|kind| {
                let instantiation = (self.instantiate)(kind);
                let qualified = format!("{}:{}", self.name, kind);
                let descriptor = FunctionDescriptor::from_host(
                    &qualified,
                    instantiation.inputs,
                    instantiation.output,
                    instantiation.host,
                );
                (kind, descriptor)
            })
            .collect()
    }
}

pub enum BuiltinDef {
    Concrete(FunctionDescriptor),
    Generic(GenericBuiltin),
}

/// A library of host functions that can be scanned into a `FunctionTable`.
pub trait BuiltinProvider {
    fn provider_name(&self) -> &'static str;
    fn builtins(&self) -> Vec<BuiltinDef>;
}

// ======================================================
//                    FUNCTION TABLE
// ======================================================
#[derive(Clone, Default)]
pub struct FunctionTable {
    by_key: FxHashMap<FunctionKey, FunctionDescriptor>,
    by_symbol: FxHashMap<String, FunctionDescriptor>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding every bundled builtin provider.
    pub fn with_standard_library() -> Self {
        let mut table = Self::new();
        table.register_provider(&ArithmeticBuiltins);
        table.register_provider(&ArrayBuiltins);
        table.register_provider(&GenericBuiltins);
        table
    }

    /// Inserts under `(name, arity)`. An existing entry for the same key is
    /// replaced and returned: last write wins.
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Option<FunctionDescriptor> {
        let key = descriptor.key();
        registry_log!("Registering ", Green key.to_string(), " as ", descriptor.symbol.as_str());

        self.by_symbol
            .insert(descriptor.symbol.clone(), descriptor.clone());

        let replaced = self.by_key.insert(key, descriptor);
        if let Some(_previous) = &replaced {
            registry_log!(Yellow "Replaced ", _previous.symbol.as_str());
        }
        replaced
    }

    pub fn register_generic(&mut self, generic: &GenericBuiltin) {
        for (kind, descriptor) in generic.expand() {
            if kind == DEFAULT_ELEMENT_KIND {
                self.register(descriptor.aliased(generic.name));
            }
            self.register(descriptor);
        }
    }

    pub fn register_provider(&mut self, provider: &dyn BuiltinProvider) {
        registry_log!("Scanning builtin provider ", Green provider.provider_name());

        for builtin in provider.builtins() {
            match builtin {
                BuiltinDef::Concrete(descriptor) => {
                    self.register(descriptor);
                }
                BuiltinDef::Generic(generic) => self.register_generic(&generic),
            }
        }
    }

    /// Resolves a call by name and argument count. Argument types are not consulted.
    pub fn lookup(
        &self,
        name: &str,
        argument_reprs: &[Repr],
    ) -> Result<&FunctionDescriptor, CompilerError> {
        self.lookup_arity(name, argument_reprs.len())
    }

    pub fn lookup_arity(
        &self,
        name: &str,
        arity: usize,
    ) -> Result<&FunctionDescriptor, CompilerError> {
        self.by_key
            .get(&FunctionKey::new(name, arity))
            .ok_or_else(|| CompilerError::function_not_found(name, arity))
    }

    pub fn by_symbol(&self, symbol: &str) -> Result<&FunctionDescriptor, CompilerError> {
        match self.by_symbol.get(symbol) {
            Some(descriptor) => Ok(descriptor),
            None => {
                // Symbols are "name/arity"
                let (name, arity) = symbol.rsplit_once('/').unwrap_or((symbol, ""));
                Err(CompilerError::function_not_found(
                    name,
                    arity.parse().unwrap_or(0),
                ))
            }
        }
    }

    pub fn contains(&self, name: &str, arity: usize) -> bool {
        self.by_key.contains_key(&FunctionKey::new(name, arity))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Every resolvable key, sorted for stable output.
    pub fn keys(&self) -> Vec<&FunctionKey> {
        let mut keys: Vec<&FunctionKey> = self.by_key.keys().collect();
        keys.sort_by(|a, b| a.name.cmp(&b.name).then(a.arity.cmp(&b.arity)));
        keys
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.keys())
            .finish()
    }
}
