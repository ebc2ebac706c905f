//! Cell type registry and the plugin table behind dynamic type definitions.

use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use crate::behavior::CellBehavior;
use crate::children::NamedChildren;
use crate::error::FrameError;
use crate::frame::Props;
use crate::identity::CellId;

/// Structural algorithm a cell type renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// One element, no child slots to point-update.
    Leaf,
    /// One element with named child slots cached per slot.
    Composite,
    /// Contributes whatever its `content` child contributes.
    Passthrough,
    /// Lays out its `elements` slot, folding into a parent sequence of the
    /// same orientation.
    Sequence,
}

/// What a constructor sees of the cell it instantiates.
#[derive(Debug, Clone, Copy)]
pub struct CellInit<'a> {
    pub identity: &'a CellId,
    pub props: &'a Props,
    pub named_children: &'a NamedChildren,
}

pub type CellConstructor = Rc<dyn Fn(&CellInit<'_>) -> Box<dyn CellBehavior>>;

#[derive(Clone)]
pub struct CellType {
    pub structure: Structure,
    pub constructor: CellConstructor,
}

impl CellType {
    pub fn instantiate(&self, init: &CellInit<'_>) -> Box<dyn CellBehavior> {
        (self.constructor)(init)
    }
}

impl fmt::Debug for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellType")
            .field("structure", &self.structure)
            .finish_non_exhaustive()
    }
}

/// Maps type tags to cell types. Entries are only ever added.
#[derive(Default)]
pub struct CellRegistry {
    types: HashMap<String, CellType>,
}

impl CellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in cells of [`crate::components`].
    pub fn with_builtin_cells() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtin_cells(&mut registry);
        registry
    }

    pub fn register_cell_type<F>(&mut self, tag: impl Into<String>, structure: Structure, constructor: F)
    where
        F: Fn(&CellInit<'_>) -> Box<dyn CellBehavior> + 'static,
    {
        let tag = tag.into();
        let cell_type = CellType {
            structure,
            constructor: Rc::new(constructor),
        };
        if self.types.insert(tag.clone(), cell_type).is_some() {
            log::warn!(target: "cells", "cell type {tag} registered twice; the later definition wins");
        }
    }

    pub fn lookup(&self, tag: &str) -> Option<&CellType> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for CellRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.types.keys().collect();
        tags.sort();
        f.debug_struct("CellRegistry").field("types", &tags).finish()
    }
}

type Installer = Rc<dyn Fn(&mut CellRegistry)>;

/// Linked plugins a frame may name in its dynamic type definitions. Each
/// plugin installs its cell types into the registry when named.
#[derive(Default)]
pub struct PluginTable {
    plugins: HashMap<String, Installer>,
}

impl PluginTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, installer: F)
    where
        F: Fn(&mut CellRegistry) + 'static,
    {
        self.plugins.insert(name.into(), Rc::new(installer));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Run the installer of `name` against `registry`.
    ///
    /// # Errors
    /// [`FrameError::UnknownPlugin`] when no plugin has that name.
    pub fn install(&self, name: &str, registry: &mut CellRegistry) -> Result<()> {
        let installer = self.plugins.get(name).ok_or_else(|| FrameError::UnknownPlugin {
            plugin: name.to_owned(),
        })?;
        installer(registry);
        log::debug!(target: "cells", "installed cell types of plugin {name}");
        Ok(())
    }
}

impl fmt::Debug for PluginTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.plugins.keys().collect();
        names.sort();
        f.debug_struct("PluginTable").field("plugins", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::StructuralCell;

    #[test]
    fn plugins_install_into_the_registry() {
        let mut registry = CellRegistry::new();
        let mut plugins = PluginTable::new();
        plugins.register("charts", |registry: &mut CellRegistry| {
            registry.register_cell_type("Chart", Structure::Passthrough, |_| Box::new(StructuralCell));
        });

        assert!(!registry.contains("Chart"));
        plugins.install("charts", &mut registry).unwrap();
        assert_eq!(registry.lookup("Chart").map(|t| t.structure), Some(Structure::Passthrough));

        let err = plugins.install("missing", &mut registry).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::UnknownPlugin {
                plugin: "missing".to_owned()
            })
        );
    }
}
