use super::{SlotType, VerificationType};
use crate::jvm::class_graph::ClassHierarchy;
use crate::jvm::{ArrayType, BinaryName, RefType};
use std::collections::HashSet;

/// Least upper bound of two slot types
///
///   * an absent slot contributes nothing
///   * `null` joined with an object type is the object type
///   * two object types join to their closest common supertype
///   * anything else that is not equal conflicts, and becomes `Top`
///
pub fn join(hierarchy: &dyn ClassHierarchy, first: &SlotType, second: &SlotType) -> SlotType {
    use VerificationType::*;

    let (first, second) = match (first, second) {
        (None, other) | (other, None) => return other.clone(),
        (Some(first), Some(second)) => (first, second),
    };

    if first == second {
        return Some(first.clone());
    }

    Some(match (first, second) {
        (Null, Object(obj)) | (Object(obj), Null) => Object(obj.clone()),
        (Object(obj1), Object(obj2)) => Object(common_supertype(hierarchy, obj1, obj2)),
        _ => Top,
    })
}

/// Find the most specific type assignable from both inputs
///
/// When neither type is assignable to the other, this walks up the superclasses of `first` until
/// finding one which `second` can be assigned to. Unknown classes end the walk, in which case
/// the answer is `java/lang/Object`.
pub fn common_supertype(
    hierarchy: &dyn ClassHierarchy,
    first: &RefType<BinaryName>,
    second: &RefType<BinaryName>,
) -> RefType<BinaryName> {
    if hierarchy.is_assignable_from(first, second) {
        return first.clone();
    }
    if hierarchy.is_assignable_from(second, first) {
        return second.clone();
    }

    match (first, second) {
        (RefType::ObjectArray(arr1), RefType::ObjectArray(arr2))
            if arr1.additional_dimensions == arr2.additional_dimensions =>
        {
            let element_type = common_superclass(hierarchy, &arr1.element_type, &arr2.element_type);
            RefType::ObjectArray(ArrayType {
                additional_dimensions: arr1.additional_dimensions,
                element_type,
            })
        }
        (RefType::Object(cls1), RefType::Object(cls2)) => {
            RefType::Object(common_superclass(hierarchy, cls1, cls2))
        }
        _ => RefType::Object(BinaryName::OBJECT),
    }
}

fn common_superclass(
    hierarchy: &dyn ClassHierarchy,
    first: &BinaryName,
    second: &BinaryName,
) -> BinaryName {
    let second_type = RefType::Object(second.clone());
    let mut visited: HashSet<BinaryName> = HashSet::new();
    let mut current = first.clone();

    while visited.insert(current.clone()) {
        if hierarchy.is_assignable_from(&RefType::Object(current.clone()), &second_type) {
            return current;
        }
        match hierarchy.lookup(&current).and_then(|record| record.superclass) {
            Some(superclass) => current = superclass,
            None => break,
        }
    }

    BinaryName::OBJECT
}
