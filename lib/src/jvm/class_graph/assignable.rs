use crate::jvm::class_graph::ClassId;
use crate::jvm::{BinaryName, RefType};
use crate::util::RefId;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Subtyping relationship between types
pub trait Assignable {
    /// Is the first type assignable to the second?
    fn is_assignable(&self, super_type: &Self) -> bool;
}

/// Walk superclasses (and, unless the target is known to be a class, interfaces) of the graph
impl<'g> Assignable for ClassId<'g> {
    fn is_assignable(&self, super_type: &ClassId<'g>) -> bool {
        let mut to_visit: Vec<ClassId<'g>> = vec![*self];
        let mut seen: HashSet<ClassId<'g>> = HashSet::new();
        seen.insert(*self);

        // Placeholders have no flags yet, so they may still turn out to be interfaces
        let skip_interfaces = super_type.declared.get() && !super_type.is_interface();

        while let Some(class) = to_visit.pop() {
            if class == *super_type {
                return true;
            }

            let supertypes = class.0.superclass.get().into_iter();
            let interfaces = class
                .0
                .interfaces
                .iter()
                .map(RefId)
                .filter(|_| !skip_interfaces);
            for supertype in supertypes.chain(interfaces) {
                if seen.insert(supertype) {
                    to_visit.push(supertype);
                }
            }
        }

        false
    }
}

/// Reference type assignability, as in the verifier's `isJavaAssignable`
///
/// Only the class-to-class case needs the hierarchy, through `class_assignable(sub, super)`. The
/// rest are the fixed rules for arrays.
pub fn is_ref_type_assignable(
    sub_type: &RefType<BinaryName>,
    super_type: &RefType<BinaryName>,
    class_assignable: &impl Fn(&BinaryName, &BinaryName) -> bool,
) -> bool {
    match (sub_type, super_type) {
        (RefType::Object(sub), RefType::Object(sup)) => class_assignable(sub, sup),

        // Every array is an `Object`, `Cloneable`, and `Serializable`
        (RefType::PrimitiveArray(_) | RefType::ObjectArray(_), RefType::Object(sup)) => {
            is_array_supertype(sup)
        }

        (RefType::PrimitiveArray(sub), RefType::PrimitiveArray(sup)) => sub == sup,

        // `[[I` is an `[Object`, but `[I` is not
        (RefType::PrimitiveArray(sub), RefType::ObjectArray(sup)) => {
            sub.additional_dimensions > sup.additional_dimensions
                && is_array_supertype(&sup.element_type)
        }

        // Arrays are covariant
        (RefType::ObjectArray(sub), RefType::ObjectArray(sup)) => {
            match sub.additional_dimensions.cmp(&sup.additional_dimensions) {
                Ordering::Less => false,
                Ordering::Equal => class_assignable(&sub.element_type, &sup.element_type),
                Ordering::Greater => is_array_supertype(&sup.element_type),
            }
        }

        _ => false,
    }
}

fn is_array_supertype(class: &BinaryName) -> bool {
    class == &BinaryName::OBJECT
        || class == &BinaryName::CLONEABLE
        || class == &BinaryName::SERIALIZABLE
}
