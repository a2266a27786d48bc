//! Standard-library lookup and its memo caches.
//!
//! Well-known types and declarations (literal default types, pointer
//! declarations, the heap-array converter, optional support) are resolved
//! by name in a designated standard scope and memoized per name in
//! explicit tables owned by the context. Lookups are by-name only; full
//! name-lookup mechanics stay outside this crate, so the standard scope is
//! a registry the compilation driver populates.

use crate::Sema;
use opal_ast::{DeclId, TyId};
use opal_core::{DiagKind, Span};
use rustc_hash::FxHashMap;

// =============================================================================
// Literal Defaults
// =============================================================================

/// The literal protocols that map to a default concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralProtocol {
    /// Character literals.
    CharacterLiteral,
    /// String literals.
    StringLiteral,
    /// String interpolations; share the string literal default.
    StringInterpolation,
    /// Integer literals.
    IntegerLiteral,
    /// Float literals.
    FloatLiteral,
    /// Array literals.
    ArrayLiteral,
    /// Dictionary literals.
    DictionaryLiteral,
}

/// Names of the standard-scope types each literal protocol defaults to.
///
/// # Example
///
/// ```ignore
/// use opal_sema::LiteralDefaults;
///
/// // A freestanding target with a trimmed standard library.
/// let defaults = LiteralDefaults {
///     integer_literal: "Int32".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LiteralDefaults {
    /// Type name for character literals.
    ///
    /// Default: `CharacterLiteralType`
    pub character_literal: String,
    /// Type name for string literals and string interpolations.
    ///
    /// Default: `StringLiteralType`
    pub string_literal: String,
    /// Type name for integer literals.
    ///
    /// Default: `IntegerLiteralType`
    pub integer_literal: String,
    /// Type name for float literals.
    ///
    /// Default: `FloatLiteralType`
    pub float_literal: String,
    /// Type name for array literals.
    ///
    /// Default: `Array`
    pub array_literal: String,
    /// Type name for dictionary literals.
    ///
    /// Default: `Dictionary`
    pub dictionary_literal: String,
}

impl Default for LiteralDefaults {
    fn default() -> Self {
        Self {
            character_literal: "CharacterLiteralType".to_string(),
            string_literal: "StringLiteralType".to_string(),
            integer_literal: "IntegerLiteralType".to_string(),
            float_literal: "FloatLiteralType".to_string(),
            array_literal: "Array".to_string(),
            dictionary_literal: "Dictionary".to_string(),
        }
    }
}

impl LiteralDefaults {
    /// The standard-scope type name `protocol` defaults to.
    pub fn type_name(&self, protocol: LiteralProtocol) -> &str {
        match protocol {
            LiteralProtocol::CharacterLiteral => &self.character_literal,
            LiteralProtocol::StringLiteral | LiteralProtocol::StringInterpolation => {
                &self.string_literal
            }
            LiteralProtocol::IntegerLiteral => &self.integer_literal,
            LiteralProtocol::FloatLiteral => &self.float_literal,
            LiteralProtocol::ArrayLiteral => &self.array_literal,
            LiteralProtocol::DictionaryLiteral => &self.dictionary_literal,
        }
    }
}

// =============================================================================
// Standard Scope
// =============================================================================

/// Name of the optional type former whose presence gates weak-storage
/// unwrapping.
const OPTIONAL_NAME: &str = "Optional";
/// Name of the standard heap-array converter member.
const ARRAY_CONVERTER_NAME: &str = "convertFromHeapArray";

/// The standard-library registry and its memo caches for one unit.
#[derive(Debug, Default)]
pub struct Stdlib {
    /// Declarations visible in the designated standard scope, by name.
    globals: FxHashMap<String, DeclId>,
    /// Memoized global type lookups, including misses.
    type_memo: FxHashMap<String, Option<TyId>>,
    /// Memoized well-known declaration lookups, including misses.
    decl_memo: FxHashMap<&'static str, Option<DeclId>>,
    /// Whether the missing-intrinsics diagnostic was already reported.
    diagnosed_missing_optional: bool,
    /// Literal-protocol default type names.
    pub defaults: LiteralDefaults,
}

impl Stdlib {
    /// Create an empty registry with default literal mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration in the standard scope.
    pub fn define_global(&mut self, name: impl Into<String>, decl: DeclId) {
        self.globals.insert(name.into(), decl);
    }

    /// Whether optional values have their support machinery available.
    pub fn has_optional_intrinsics(&self) -> bool {
        self.globals.contains_key(OPTIONAL_NAME)
    }
}

impl Sema {
    /// Resolve a well-known type by name in the standard scope, validating
    /// its declaration. Memoized per name, misses included.
    pub fn lookup_global_type(&mut self, name: &str) -> Option<TyId> {
        if let Some(&cached) = self.stdlib.type_memo.get(name) {
            return cached;
        }

        let decl = self.stdlib.globals.get(name).copied();
        let resolved = match decl {
            Some(decl) => {
                self.validate_decl(decl);
                self.ast.decls[decl].declared_ty
            }
            None => None,
        };
        self.stdlib.type_memo.insert(name.to_string(), resolved);
        resolved
    }

    /// The concrete default type for a literal protocol, with one level of
    /// alias sugar stripped so the alias name itself is never displayed.
    pub fn default_literal_type(&mut self, protocol: LiteralProtocol) -> Option<TyId> {
        let name = self.stdlib.defaults.type_name(protocol).to_string();
        let ty = self.lookup_global_type(&name)?;
        Some(self.ast.tys.strip_one_sugar(ty))
    }

    /// A well-known declaration resolved once and cached.
    fn known_decl(&mut self, name: &'static str) -> Option<DeclId> {
        if let Some(&cached) = self.stdlib.decl_memo.get(name) {
            return cached;
        }
        let decl = self.stdlib.globals.get(name).copied();
        self.stdlib.decl_memo.insert(name, decl);
        decl
    }

    /// The standard `UnsafePointer` declaration, if present.
    pub fn unsafe_pointer_decl(&mut self) -> Option<DeclId> {
        self.known_decl("UnsafePointer")
    }

    /// The standard `CConstPointer` declaration, if present.
    pub fn c_const_pointer_decl(&mut self) -> Option<DeclId> {
        self.known_decl("CConstPointer")
    }

    /// The standard `CMutablePointer` declaration, if present.
    pub fn c_mutable_pointer_decl(&mut self) -> Option<DeclId> {
        self.known_decl("CMutablePointer")
    }

    /// The standard heap-array converter declaration, if present.
    pub fn array_converter_decl(&mut self) -> Option<DeclId> {
        self.known_decl(ARRAY_CONVERTER_NAME)
    }

    /// Check that optional values can be operated on. Reports
    /// [`DiagKind::MissingOptionalIntrinsics`] at most once per unit and
    /// returns `true` when support is missing.
    pub fn require_optional_intrinsics(&mut self, span: Span) -> bool {
        if self.stdlib.has_optional_intrinsics() {
            return false;
        }
        if !self.stdlib.diagnosed_missing_optional {
            self.stdlib.diagnosed_missing_optional = true;
            self.diags.report(DiagKind::MissingOptionalIntrinsics, span);
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
