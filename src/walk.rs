//! The recursive pass over a record's fields.

use core::ptr;

use facet_core::{Field, PtrConst, Shape};
use facet_reflect::{HeapValue, Peek};

use crate::{
    DefaultsError, DefaultsErrorKind, Environment, MissingEnv, Result,
    coerce::{self, layout_size},
    descriptor::{FieldDescriptor, TypeShape, fields_of},
    env,
};

/// One `apply` call: walks a record in place, tracking the current field path.
pub(crate) struct Walker<'env> {
    env: &'env dyn Environment,
    missing_env: MissingEnv,
    max_depth: usize,
    depth: usize,
    path: Vec<&'static str>,
}

impl<'env> Walker<'env> {
    pub(crate) fn new(env: &'env dyn Environment, missing_env: MissingEnv, max_depth: usize) -> Self {
        Self {
            env,
            missing_env,
            max_depth,
            depth: 0,
            path: Vec::new(),
        }
    }

    /// Visits every field of the record at `base` in declaration order.
    ///
    /// # Safety
    ///
    /// `base` must point to a live, initialized value of `shape` that nothing
    /// else accesses for the duration of the call.
    pub(crate) unsafe fn walk_record(&mut self, base: *mut u8, shape: &'static Shape) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error(None, DefaultsErrorKind::DepthExceeded(self.max_depth)));
        }
        let fields = fields_of(shape).map_err(|kind| self.error(None, kind))?;
        log::trace!("Walking {shape} at {}", self.display_path());

        self.depth += 1;
        let result = unsafe { self.walk_fields(base, fields) };
        self.depth -= 1;
        result
    }

    unsafe fn walk_fields(&mut self, base: *mut u8, fields: &'static [Field]) -> Result<()> {
        for field in fields {
            self.path.push(field.name);
            let result = match FieldDescriptor::of(field) {
                // SAFETY: the field lives inside the record at `base`.
                Ok(descriptor) => unsafe { self.walk_field(base, &descriptor) },
                Err(kind) => Err(self.error(None, kind)),
            };
            self.path.pop();
            result?;
        }
        Ok(())
    }

    unsafe fn walk_field(&mut self, base: *mut u8, field: &FieldDescriptor) -> Result<()> {
        if !field.exported {
            log::trace!("Skipping unexported field {}", self.display_path());
            return Ok(());
        }
        // SAFETY: facet offsets stay within the record.
        let slot = unsafe { base.add(field.offset) };

        match field.type_shape {
            TypeShape::Record => {
                if field.spec.literal().is_some() {
                    log::trace!(
                        "Ignoring literal on record field {}, walking it instead",
                        self.display_path()
                    );
                }
                if field.embedded {
                    log::trace!("Walking flattened record {}", self.display_path());
                }
                unsafe { self.walk_record(slot, field.shape) }
            }
            TypeShape::RecordRef { nullable, pointee } => {
                if field.spec.is_disabled() {
                    log::trace!("Leaving disabled field {} alone", self.display_path());
                    return Ok(());
                }
                let mut target = unsafe { read_pointer(slot) };
                if target.is_null() && nullable {
                    if !coerce::can_zero(pointee) {
                        log::trace!(
                            "{pointee} has no zero value, leaving {} unallocated",
                            self.display_path()
                        );
                        return Ok(());
                    }
                    log::trace!("Allocating {pointee} for {}", self.display_path());
                    let staged = coerce::stage_allocated_record(field.shape)
                        .map_err(|kind| self.error(None, kind))?;
                    unsafe { replace(slot, staged, field.shape) }
                        .map_err(|kind| self.error(None, kind))?;
                    target = unsafe { read_pointer(slot) };
                }
                unsafe { self.walk_record(target, pointee) }
            }
            _ => unsafe { self.fill_leaf(slot, field) },
        }
    }

    unsafe fn fill_leaf(&mut self, slot: *mut u8, field: &FieldDescriptor) -> Result<()> {
        let Some(literal) = field.spec.literal() else {
            log::trace!("No default declared for {}", self.display_path());
            return Ok(());
        };
        if matches!(field.type_shape, TypeShape::Unsupported) {
            return Err(self.error(
                Some(literal),
                DefaultsErrorKind::UnsupportedTypeShape(field.shape.to_string()),
            ));
        }
        if !unsafe { is_zero(slot, field.shape) } {
            log::trace!("Keeping caller-set value of {}", self.display_path());
            return Ok(());
        }

        let resolved = env::resolve(literal, self.env, self.missing_env)
            .map_err(|kind| self.error(Some(literal), kind))?;
        let staged =
            coerce::stage(field.shape, &resolved).map_err(|kind| self.error(Some(&resolved), kind))?;
        unsafe { replace(slot, staged, field.shape) }
            .map_err(|kind| self.error(Some(&resolved), kind))?;

        log::debug!("Defaulted {} to {resolved:?}", self.display_path());
        Ok(())
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }

    fn error(&self, literal: Option<&str>, kind: DefaultsErrorKind) -> DefaultsError {
        DefaultsError::new(self.path.join("."), literal, kind)
    }
}

/// Reads the thin pointer held by a `Box<R>` or `Option<Box<R>>` slot.
///
/// Null means `None`.
unsafe fn read_pointer(slot: *mut u8) -> *mut u8 {
    unsafe { ptr::read(slot.cast::<*mut u8>()) }
}

/// Moves `staged` into `slot`; the value previously in `slot` is dropped.
unsafe fn replace(
    slot: *mut u8,
    staged: HeapValue<'static>,
    shape: &'static Shape,
) -> core::result::Result<(), DefaultsErrorKind> {
    let size = layout_size(shape)?;
    let staged_ptr = staged.peek().data().as_byte_ptr().cast_mut();
    // SAFETY: both sides hold a valid value of `shape`; after the swap the
    // heap value owns the old one and drops it.
    unsafe { ptr::swap_nonoverlapping(slot, staged_ptr, size) };
    drop(staged);
    Ok(())
}

/// Whether the value at `ptr` is its type's zero value.
///
/// Shapes without a zero notion (boxes, unsupported types) never are.
unsafe fn is_zero(ptr: *const u8, shape: &'static Shape) -> bool {
    match TypeShape::of(shape) {
        TypeShape::Bool | TypeShape::Integer { .. } | TypeShape::Float { .. } | TypeShape::Char => {
            let Ok(size) = layout_size(shape) else {
                return false;
            };
            // SAFETY: primitives have no padding, every byte is initialized.
            unsafe { core::slice::from_raw_parts(ptr, size) }
                .iter()
                .all(|b| *b == 0)
        }
        TypeShape::String => unsafe { (&*ptr.cast::<String>()).is_empty() },
        TypeShape::RecordRef { nullable, .. } => {
            nullable && unsafe { ptr::read(ptr.cast::<*const u8>()) }.is_null()
        }
        TypeShape::Boxed(_) => false,
        TypeShape::Optional(_) => unsafe { peek(ptr, shape) }
            .into_option()
            .is_ok_and(|option| option.is_none()),
        TypeShape::List(_) => unsafe { peek(ptr, shape) }
            .into_list_like()
            .is_ok_and(|list| list.len() == 0),
        TypeShape::Map { .. } => unsafe { peek(ptr, shape) }
            .into_map()
            .is_ok_and(|map| map.len() == 0),
        TypeShape::Array { element, len } => {
            let Ok(stride) = layout_size(element) else {
                return false;
            };
            (0..len).all(|idx| unsafe { is_zero(ptr.add(idx * stride), element) })
        }
        TypeShape::Record => fields_of(shape).is_ok_and(|fields| {
            fields
                .iter()
                .all(|field| unsafe { is_zero(ptr.add(field.offset), field.shape) })
        }),
        TypeShape::Unsupported => false,
    }
}

unsafe fn peek<'mem>(ptr: *const u8, shape: &'static Shape) -> Peek<'mem, 'static> {
    unsafe { Peek::unchecked_new(PtrConst::new(ptr), shape) }
}
