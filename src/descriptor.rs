//! Classifying a record's fields for the walker.

use facet_core::{Def, Field, FieldAttribute, FieldFlags, KnownPointer, Shape, Type, UserType};
use facet_reflect::ScalarType;

use crate::{DefaultSpec, DefaultsError, DefaultsErrorKind};

/// Structural category of a field's type, as far as defaulting is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeShape {
    /// `bool`
    Bool,
    /// Any primitive integer.
    Integer {
        /// Whether the type is signed.
        signed: bool,
        /// Bit-width of the type.
        bits: u32,
    },
    /// `f32` or `f64`
    Float {
        /// Bit-width of the type.
        bits: u32,
    },
    /// `char`
    Char,
    /// `String`
    String,
    /// `Option<T>` around anything but a boxed record.
    Optional(&'static Shape),
    /// `Box<T>` around anything but a record.
    Boxed(&'static Shape),
    /// A struct held by value, including `#[facet(flatten)]` ones.
    Record,
    /// A boxed struct: `Option<Box<R>>` when nullable, `Box<R>` otherwise.
    RecordRef {
        /// Whether the reference can be absent.
        nullable: bool,
        /// Shape of the pointed-to record.
        pointee: &'static Shape,
    },
    /// `[T; N]`
    Array {
        /// Element shape.
        element: &'static Shape,
        /// Number of elements.
        len: usize,
    },
    /// `Vec<T>`
    List(&'static Shape),
    /// `HashMap<K, V>`, `BTreeMap<K, V>`
    Map {
        /// Key shape.
        key: &'static Shape,
        /// Value shape.
        value: &'static Shape,
    },
    /// Anything without a defaulting rule: enums, `Rc`, references...
    Unsupported,
}

impl TypeShape {
    /// Classifies `shape`.
    pub fn of(shape: &'static Shape) -> Self {
        if let Some(scalar) = ScalarType::try_from_shape(shape) {
            if let Some(type_shape) = Self::of_scalar(scalar) {
                return type_shape;
            }
        }

        match shape.def {
            Def::Option(option_def) => match boxed_record(option_def.t) {
                Some(pointee) => TypeShape::RecordRef {
                    nullable: true,
                    pointee,
                },
                None => TypeShape::Optional(option_def.t),
            },
            Def::Pointer(_) => match (boxed_record(shape), box_pointee(shape)) {
                (Some(pointee), _) => TypeShape::RecordRef {
                    nullable: false,
                    pointee,
                },
                (None, Some(pointee)) => TypeShape::Boxed(pointee),
                (None, None) => TypeShape::Unsupported,
            },
            Def::List(list_def) => TypeShape::List((list_def.t)()),
            Def::Array(array_def) => TypeShape::Array {
                element: array_def.t,
                len: array_def.n,
            },
            Def::Map(map_def) => TypeShape::Map {
                key: (map_def.k)(),
                value: (map_def.v)(),
            },
            _ if is_record(shape) => TypeShape::Record,
            _ => TypeShape::Unsupported,
        }
    }

    fn of_scalar(scalar: ScalarType) -> Option<Self> {
        let integer = |signed, bits| Some(TypeShape::Integer { signed, bits });
        match scalar {
            ScalarType::Bool => Some(TypeShape::Bool),
            ScalarType::Char => Some(TypeShape::Char),
            ScalarType::String => Some(TypeShape::String),
            ScalarType::F32 => Some(TypeShape::Float { bits: 32 }),
            ScalarType::F64 => Some(TypeShape::Float { bits: 64 }),
            ScalarType::U8 => integer(false, u8::BITS),
            ScalarType::U16 => integer(false, u16::BITS),
            ScalarType::U32 => integer(false, u32::BITS),
            ScalarType::U64 => integer(false, u64::BITS),
            ScalarType::U128 => integer(false, u128::BITS),
            ScalarType::USize => integer(false, usize::BITS),
            ScalarType::I8 => integer(true, i8::BITS),
            ScalarType::I16 => integer(true, i16::BITS),
            ScalarType::I32 => integer(true, i32::BITS),
            ScalarType::I64 => integer(true, i64::BITS),
            ScalarType::I128 => integer(true, i128::BITS),
            ScalarType::ISize => integer(true, isize::BITS),
            _ => None,
        }
    }

    /// Whether the walker recurses into this field rather than assigning it.
    pub fn is_record_like(&self) -> bool {
        matches!(self, TypeShape::Record | TypeShape::RecordRef { .. })
    }
}

/// A struct with fields of its own, as opposed to an opaque or container type.
pub(crate) fn is_record(shape: &'static Shape) -> bool {
    matches!(shape.ty, Type::User(UserType::Struct(_)))
        && !matches!(
            shape.def,
            Def::Scalar | Def::List(_) | Def::Map(_) | Def::Array(_) | Def::Option(_) | Def::Pointer(_)
        )
}

fn box_pointee(shape: &'static Shape) -> Option<&'static Shape> {
    match shape.def {
        Def::Pointer(ptr_def) if matches!(ptr_def.known, Some(KnownPointer::Box)) => {
            ptr_def.pointee()
        }
        _ => None,
    }
}

fn boxed_record(shape: &'static Shape) -> Option<&'static Shape> {
    box_pointee(shape).filter(|pointee| is_record(pointee))
}

/// Everything the walker needs to know about one field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name; tuple fields are named by index.
    pub name: &'static str,
    /// Byte offset of the field inside its record.
    pub offset: usize,
    /// Shape of the field's type.
    pub shape: &'static Shape,
    /// Classification of [`Self::shape`].
    pub type_shape: TypeShape,
    /// Declared default.
    pub spec: DefaultSpec,
    /// `false` for `#[facet(skip)]` fields, which are never touched.
    pub exported: bool,
    /// `true` for `#[facet(flatten)]` fields.
    pub embedded: bool,
}

impl FieldDescriptor {
    /// Reads the descriptor off a facet field.
    pub fn of(field: &Field) -> Result<Self, DefaultsErrorKind> {
        let shape = field.shape;
        Ok(Self {
            name: field.name,
            offset: field.offset,
            shape,
            type_shape: TypeShape::of(shape),
            spec: DefaultSpec::of(field)?,
            exported: !field
                .attributes
                .contains(&FieldAttribute::Arbitrary("skip")),
            embedded: field.flags.contains(FieldFlags::FLATTEN),
        })
    }
}

/// Fields of a struct shape, in declaration order.
pub(crate) fn fields_of(shape: &'static Shape) -> Result<&'static [Field], DefaultsErrorKind> {
    match &shape.ty {
        Type::User(UserType::Struct(struct_type)) if is_record(shape) => Ok(struct_type.fields),
        _ => Err(DefaultsErrorKind::NotARecord(shape.to_string())),
    }
}

/// Lists the field descriptors of a record shape.
///
/// ```rust
/// use facet::Facet;
/// use facet_defaults::{DefaultSpec, TypeShape, describe};
///
/// #[derive(Facet)]
/// struct Limits {
///     #[facet(default_value = "64")]
///     max_conns: u16,
///     label: String,
/// }
///
/// let fields = describe(Limits::SHAPE)?;
/// assert_eq!(fields[0].name, "max_conns");
/// assert_eq!(fields[0].spec, DefaultSpec::Literal("64".into()));
/// assert_eq!(fields[0].type_shape, TypeShape::Integer { signed: false, bits: 16 });
/// assert_eq!(fields[1].spec, DefaultSpec::Absent);
/// # Ok::<(), facet_defaults::DefaultsError>(())
/// ```
pub fn describe(shape: &'static Shape) -> Result<Vec<FieldDescriptor>, DefaultsError> {
    fields_of(shape)
        .map_err(|kind| DefaultsError::new("", None, kind))?
        .iter()
        .map(|field| {
            FieldDescriptor::of(field).map_err(|kind| DefaultsError::new(field.name, None, kind))
        })
        .collect()
}
