use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::node::Scalar;
use super::value::{TypeTag, Value};

/// Storage behind a [`ValueSlot`].
#[derive(Debug, Default)]
pub struct SlotCell {
    value: Value,
    ty: TypeTag,
}

/// Shared, mutable storage location for one runtime value.
///
/// Cloning a `ValueSlot` clones the handle, not the storage: both handles
/// observe the same value. Op-lines take operands by `&ValueSlot` and keep
/// their result as an owned handle.
#[derive(Clone, Default)]
pub struct ValueSlot(Rc<RefCell<SlotCell>>);

impl ValueSlot {
    /// A fresh, empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh slot holding `value`, tagged from its shape.
    pub fn with_value(value: Value) -> Self {
        let slot = Self::new();
        slot.assign(value);
        slot
    }

    pub fn value(&self) -> Value {
        self.0.borrow().value.clone()
    }

    pub fn ty(&self) -> TypeTag {
        self.0.borrow().ty
    }

    /// Replace the value, leaving the type tag alone.
    pub fn set_value(&self, value: Value) {
        self.0.borrow_mut().value = value;
    }

    pub fn set_type(&self, ty: TypeTag) {
        self.0.borrow_mut().ty = ty;
    }

    /// Re-derive the type tag from the current value.
    pub fn rebuild_type(&self) {
        let mut cell = self.0.borrow_mut();
        cell.ty = cell.value.type_tag();
    }

    /// Replace the value and re-derive the tag.
    pub fn assign(&self, value: Value) {
        self.set_value(value);
        self.rebuild_type();
    }

    /// Store a literal taken straight from the syntax tree.
    ///
    /// The tag is always `String`, whatever the literal's shape.
    pub fn set_literal(&self, scalar: &Scalar) {
        self.set_value(Value::from(scalar));
        self.set_type(TypeTag::String);
    }

    /// Append to the composite value, turning a non-array into an empty array
    /// first.
    pub fn push(&self, element: Value) {
        let mut cell = self.0.borrow_mut();
        match &mut cell.value {
            Value::Array(items) => items.push(element),
            other => *other = Value::Array(vec![element]),
        }
        cell.ty = TypeTag::Array;
    }

    /// Elements of the composite value; empty for non-arrays.
    pub fn elements(&self) -> Vec<Value> {
        match &self.0.borrow().value {
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether both handles name the same storage.
    pub fn ptr_eq(&self, other: &ValueSlot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared storage; stable for the slot's lifetime.
    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for ValueSlot {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ValueSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(cell) => f
                .debug_struct("ValueSlot")
                .field("value", &cell.value)
                .field("ty", &cell.ty)
                .finish(),
            Err(_) => f.write_str("ValueSlot(<borrowed>)"),
        }
    }
}
