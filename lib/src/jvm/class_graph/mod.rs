//! Class hierarchy queries needed by the typed analysis
//!
//! Joining two object types requires knowing how classes relate: which classes extend which, and
//! which interfaces they implement. That knowledge lives behind the [`ClassHierarchy`] trait,
//! which only needs to answer [`ClassHierarchy::lookup`]. Assignability (including the special
//! rules for arrays) is derived from that.
//!
//! [`ClassGraph`] is the main implementation: an arena-backed graph to which classes can be added
//! incrementally, even before their supertypes are known.

use crate::jvm::{BinaryName, ClassAccessFlags, RefType};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use typed_arena::Arena;

mod assignable;
mod java_classes;

pub use assignable::*;
pub use java_classes::*;

/// Direct supertypes of a class or interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// Superclass is only ever missing for `java/lang/Object` itself (or for unknown supertypes)
    pub superclass: Option<BinaryName>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: Vec<BinaryName>,

    /// Is this an interface?
    pub is_interface: bool,
}

/// Oracle for the class hierarchy
pub trait ClassHierarchy {
    /// Find the direct supertypes of a class (`None` if the class is unknown)
    fn lookup(&self, name: &BinaryName) -> Option<ClassRecord>;

    /// Is `sub_type` a subclass or subinterface of `super_type` (or the same class)?
    ///
    /// This does a search up the superclasses and superinterfaces. Cycles (which can only come
    /// from a malformed hierarchy) are visited at most once.
    fn is_subclass(&self, sub_type: &BinaryName, super_type: &BinaryName) -> bool {
        let mut supertypes_to_visit: Vec<BinaryName> = vec![sub_type.clone()];
        let mut dont_revisit: HashSet<BinaryName> = HashSet::new();
        dont_revisit.insert(sub_type.clone());

        while let Some(class_name) = supertypes_to_visit.pop() {
            if &class_name == super_type {
                return true;
            }
            if let Some(record) = self.lookup(&class_name) {
                for supertype in record.superclass.into_iter().chain(record.interfaces) {
                    if dont_revisit.insert(supertype.clone()) {
                        supertypes_to_visit.push(supertype);
                    }
                }
            }
        }

        false
    }

    /// Can a value of type `sub_type` be assigned to a location of type `super_type`?
    ///
    /// Every type is assignable to `java/lang/Object`, even if neither type is known.
    fn is_assignable_from(
        &self,
        super_type: &RefType<BinaryName>,
        sub_type: &RefType<BinaryName>,
    ) -> bool {
        is_ref_type_assignable(sub_type, super_type, &|sub: &BinaryName, sup: &BinaryName| {
            sup == &BinaryName::OBJECT || self.is_subclass(sub, sup)
        })
    }
}

/// Plain map from class name to its supertypes
impl ClassHierarchy for HashMap<BinaryName, ClassRecord> {
    fn lookup(&self, name: &BinaryName) -> Option<ClassRecord> {
        self.get(name).cloned()
    }
}

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a class in a [`ClassGraph`] (compared by identity)
pub type ClassId<'g> = RefId<'g, ClassData<'g>>;

/// Tracks the relationships between classes/interfaces
///
/// Classes can be referenced (eg. as superclasses) before they are declared. Such classes are
/// created as placeholders and then filled in when they are declared. Until then, `lookup` treats
/// them as unknown.
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: FrozenMap<&'g BinaryName, ClassId<'g>>,
}

impl<'g> ClassGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        ClassGraph {
            arenas,
            classes: FrozenMap::new(),
        }
    }

    /// Find a class (declared or placeholder)
    pub fn lookup_class(&self, name: &BinaryName) -> Option<ClassId<'g>> {
        self.classes.map_get(name, |class| *class)
    }

    /// Find a class or create an undeclared placeholder for it
    pub fn get_or_create(&self, name: &BinaryName) -> ClassId<'g> {
        if let Some(class) = self.lookup_class(name) {
            return class;
        }
        let data: &'g ClassData<'g> = self.arenas.class_arena.alloc(ClassData {
            name: name.clone(),
            superclass: Cell::new(None),
            interfaces: FrozenVec::new(),
            access_flags: Cell::new(ClassAccessFlags::empty()),
            declared: Cell::new(false),
        });
        self.classes.insert(&data.name, RefId(data));
        RefId(data)
    }

    /// Declare a class along with its direct supertypes
    ///
    /// Redeclaring a class overwrites its superclass and flags, but only adds interfaces that
    /// were not already present.
    pub fn declare(
        &self,
        name: &BinaryName,
        superclass: Option<&BinaryName>,
        interfaces: &[BinaryName],
        access_flags: ClassAccessFlags,
    ) -> ClassId<'g> {
        let class = self.get_or_create(name);
        if class.declared.get() {
            log::debug!("Redeclaring class {}", name);
        }
        class
            .superclass
            .set(superclass.map(|superclass| self.get_or_create(superclass)));
        for interface in interfaces {
            let interface = self.get_or_create(interface);
            if !class.implements_directly(interface) {
                class.interfaces.push(interface);
            }
        }
        class.access_flags.set(access_flags);
        class.declared.set(true);
        class
    }

    /// Add standard types to the class graph
    pub fn insert_java_library_types(&self) -> JavaClasses<'g> {
        JavaClasses::add_to_graph(self)
    }
}

impl<'g> ClassHierarchy for ClassGraph<'g> {
    fn lookup(&self, name: &BinaryName) -> Option<ClassRecord> {
        let class = self.lookup_class(name)?;
        if !class.declared.get() {
            return None;
        }
        Some(ClassRecord {
            superclass: class.superclass.get().map(|superclass| superclass.name.clone()),
            interfaces: class
                .interfaces
                .iter()
                .map(|interface| interface.name.clone())
                .collect(),
            is_interface: class.is_interface(),
        })
    }

    /// Subclass checks follow the graph edges directly instead of going through names
    fn is_subclass(&self, sub_type: &BinaryName, super_type: &BinaryName) -> bool {
        match (self.lookup_class(sub_type), self.lookup_class(super_type)) {
            (Some(sub_type), Some(super_type)) => sub_type.is_assignable(&super_type),
            _ => sub_type == super_type,
        }
    }
}

pub struct ClassData<'g> {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass (missing for `java/lang/Object` and for placeholders)
    pub superclass: Cell<Option<ClassId<'g>>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<ClassId<'g>>,

    pub access_flags: Cell<ClassAccessFlags>,

    /// Has the class been declared, or is it just a placeholder?
    pub declared: Cell<bool>,
}

impl<'g> ClassData<'g> {
    /// Is this an interface?
    pub fn is_interface(&self) -> bool {
        self.access_flags.get().contains(ClassAccessFlags::INTERFACE)
    }

    fn implements_directly(&self, interface: ClassId<'g>) -> bool {
        self.interfaces
            .iter()
            .any(|existing| std::ptr::eq(existing, interface.0))
    }
}

impl<'g> PartialEq for ClassData<'g> {
    fn eq(&self, other: &ClassData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for ClassData<'g> {}

impl<'g> fmt::Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_ref())
    }
}
