//! Persisted container of lowered functions.
//!
//! Members are collected by an `AssemblyBuilder` and sealed into an `Assembly`,
//! which serializes to JSON. A stored assembly only names its callees by
//! symbol, so it has to be bound against a `FunctionTable` before anything in
//! it can run.

use crate::backends::bytecode::value::Value;
use crate::backends::bytecode::{FunctionBody, FunctionSignature};
use crate::backends::emit::ephemeral::CompiledFunction;
use crate::backends::emit::{EmissionTarget, FunctionBuilder};
use crate::backends::registry::{FunctionTable, HostFn};
use crate::codegen_log;
use crate::compiler_messages::compiler_errors::{CompilerError, ErrorMetaDataKey};
use crate::return_emission_error;
use crate::settings::{ASSEMBLY_FORMAT_VERSION, DEFAULT_MAX_STEPS, LoweringConfig};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    pub index: usize,
    pub name: String,
}

#[derive(Debug)]
pub struct AssemblyBuilder {
    name: String,
    keep_debug_names: bool,
    members: Vec<FunctionBody>,
}

impl AssemblyBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            keep_debug_names: true,
            members: Vec::new(),
        }
    }

    pub fn from_config(config: &LoweringConfig) -> Self {
        Self {
            name: config.assembly_name.clone(),
            keep_debug_names: config.emit_debug_names,
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members
            .iter()
            .any(|body| body.signature.name == member)
    }

    pub fn seal(self) -> Assembly {
        codegen_log!("Sealed assembly ", Green self.name.as_str());
        Assembly {
            format_version: ASSEMBLY_FORMAT_VERSION,
            name: self.name,
            members: self.members,
        }
    }

    fn check_unique(&self, member: &str) -> Result<(), CompilerError> {
        if self.contains(member) {
            return_emission_error!(
                "Assembly '{}' already has a member named '{}'",
                self.name,
                member
            );
        }
        Ok(())
    }
}

impl EmissionTarget for AssemblyBuilder {
    type Sink = FunctionBuilder;
    type Handle = MemberHandle;

    fn begin_function(&mut self, signature: FunctionSignature) -> Result<FunctionBuilder, CompilerError> {
        self.check_unique(&signature.name)?;
        Ok(FunctionBuilder::new(signature, self.keep_debug_names))
    }

    fn complete_function(&mut self, sink: FunctionBuilder) -> Result<MemberHandle, CompilerError> {
        // Another member with this name may have completed since this one began
        self.check_unique(sink.name())?;

        let (body, _) = sink.finish()?;
        let handle = MemberHandle {
            index: self.members.len(),
            name: body.signature.name.clone(),
        };
        self.members.push(body);
        Ok(handle)
    }
}

// ======================================================
//                  SEALED ASSEMBLIES
// ======================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub format_version: u32,
    pub name: String,
    pub members: Vec<FunctionBody>,
}

impl Assembly {
    pub fn member(&self, name: &str) -> Option<&FunctionBody> {
        self.members.iter().find(|body| body.signature.name == name)
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .map(|body| body.signature.name.as_str())
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CompilerError> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            CompilerError::emission_error(format!("Could not serialize '{}': {}", self.name, e))
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CompilerError> {
        let assembly: Assembly = serde_json::from_slice(bytes)
            .map_err(|e| CompilerError::emission_error(format!("Malformed assembly: {}", e)))?;

        if assembly.format_version != ASSEMBLY_FORMAT_VERSION {
            return_emission_error!(
                "Assembly '{}' has format version {}, expected {}",
                assembly.name,
                assembly.format_version,
                ASSEMBLY_FORMAT_VERSION
            );
        }

        Ok(assembly)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CompilerError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| CompilerError::file_error(path, e.to_string()))
    }

    pub fn read_from(path: &Path) -> Result<Self, CompilerError> {
        let bytes = std::fs::read(path).map_err(|e| CompilerError::file_error(path, e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn bind(&self, table: &FunctionTable) -> Result<LoadedAssembly, CompilerError> {
        self.bind_with_limit(table, DEFAULT_MAX_STEPS)
    }

    /// Re-resolves every import by symbol. The table must still provide each
    /// callee with the signature it had when the member was lowered.
    pub fn bind_with_limit(
        &self,
        table: &FunctionTable,
        max_steps: u64,
    ) -> Result<LoadedAssembly, CompilerError> {
        let mut members = Vec::with_capacity(self.members.len());
        let mut by_name = FxHashMap::default();

        for body in &self.members {
            let mut hosts: Vec<HostFn> = Vec::with_capacity(body.imports.len());

            for import in &body.imports {
                let descriptor = table
                    .by_symbol(&import.symbol)
                    .map_err(|e| e.with_function(&body.signature.name))?;

                if descriptor.inputs != import.inputs || descriptor.output != import.output {
                    return Err(CompilerError::emission_error(format!(
                        "'{}' no longer matches the signature it was lowered against",
                        import.symbol
                    ))
                    .with_function(&body.signature.name)
                    .with_metadata(
                        ErrorMetaDataKey::PrimarySuggestion,
                        "Lower the function again against the current function table",
                    ));
                }

                hosts.push(descriptor.host.clone());
            }

            by_name.insert(body.signature.name.clone(), members.len());
            members.push(CompiledFunction::new(body.clone(), hosts, max_steps));
        }

        Ok(LoadedAssembly {
            name: self.name.clone(),
            members,
            by_name,
        })
    }
}

/// A sealed assembly whose members are ready to run.
#[derive(Debug)]
pub struct LoadedAssembly {
    name: String,
    members: Vec<CompiledFunction>,
    by_name: FxHashMap<String, usize>,
}

impl LoadedAssembly {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, member: &str) -> Option<&CompiledFunction> {
        self.by_name.get(member).map(|index| &self.members[*index])
    }

    pub fn member_at(&self, handle: &MemberHandle) -> Option<&CompiledFunction> {
        self.members.get(handle.index)
    }

    pub fn invoke(&self, member: &str, arguments: &[Value]) -> Result<Value, CompilerError> {
        match self.get(member) {
            Some(function) => function.invoke(arguments),
            None => return_emission_error!("Assembly '{}' has no member '{}'", self.name, member),
        }
    }
}
