//! Known Swift runtime and Foundation prototypes, applied by symbol name.
//!
//! This is static configuration, not analysis: a flat catalog of mangled
//! symbol names mapped to the prototype the host should apply at each
//! symbol's address, plus the auxiliary declarations those prototypes
//! reference. The catalog is consumed through two host seams and never
//! changes at runtime.

use serde::Serialize;
use tracing::debug;

/// Auxiliary struct/typedef declarations the host must parse before any
/// catalog prototype referencing them can be applied.
pub const SWIFT_DECLS: &str = r#"
typedef long long s64;
typedef unsigned long long u64;

typedef s64 Int;
typedef u64 Bool;

struct Swift::String
{
  u64 _countAndFlagsBits;
  void *_object;
};

union Swift_ElementAny {
    Swift::String stringElement;
};

struct Swift_Any {
    Swift_ElementAny element;
    u64 unknown;
    s64 type;
};

struct Swift_ArrayAny {
    s64 length;
    Swift_Any *items;
};
"#;

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureEntry {
    /// Mangled (or runtime) symbol name, with the host's leading underscore.
    pub symbol: &'static str,
    /// Prototype string in the host's type syntax.
    pub prototype: &'static str,
}

/// The signature catalog.
pub const SIGNATURES: &[SignatureEntry] = &[
    // Foundation.URL
    SignatureEntry {
        symbol: "_$s10Foundation3URLV6stringACSgSSh_tcfC",
        prototype: "void __swiftcall URL_init_string__(__int64 *__return_ptr, Swift::String url)",
    },
    SignatureEntry {
        symbol: "_$s10Foundation3URLV4pathSSvg",
        prototype: "Swift::String __usercall URL_path_getter@<X0:X1>(void *@<X20>)",
    },
    SignatureEntry {
        symbol: "_$s10Foundation3URLV22appendingPathComponentyACSSF",
        prototype: "__int64 __usercall URL_appendingPathComponent____@<X0>(void *@<X20>, Swift::String@<X0:X1>)",
    },
    // print()
    SignatureEntry {
        symbol: "_$ss5print_9separator10terminatoryypd_S2StF",
        prototype: "void __fastcall print___separator_terminator__(Swift_ArrayAny *, Swift::String, Swift::String)",
    },
    SignatureEntry {
        symbol: "_$ss10debugPrint_9separator10terminatoryypd_S2StFfA0_",
        prototype: "Swift::String default_argument_1_of_debugPrint___separator_terminator__(void)",
    },
    // Arrays
    SignatureEntry {
        symbol: "_$ss27_allocateUninitializedArrayySayxG_BptBwlF",
        prototype: "Swift_ArrayAny *__fastcall _allocateUninitializedArray_A(u64 count, void *arrayType)",
    },
    SignatureEntry {
        symbol: "_$ss27_finalizeUninitializedArrayySayxGABnlF",
        prototype: "Swift_ArrayAny *__fastcall _finalizeUninitializedArray_A(Swift_ArrayAny *, void *arrayType)",
    },
    // Bridging
    SignatureEntry {
        symbol: "_$sSS10FoundationE36_unconditionallyBridgeFromObjectiveCySSSo8NSStringCSgFZ",
        prototype: "Swift::String __fastcall static_String__unconditionallyBridgeFromObjectiveC____(id)",
    },
    SignatureEntry {
        symbol: "_$sSS10FoundationE19_bridgeToObjectiveCSo8NSStringCyF",
        prototype: "NSString __swiftcall String__bridgeToObjectiveC__(Swift::String)",
    },
    SignatureEntry {
        symbol: "_swift_bridgeObjectRelease",
        prototype: "void swift_bridgeObjectRelease(id)",
    },
    SignatureEntry {
        symbol: "_swift_bridgeObjectRetain",
        prototype: "id swift_bridgeObjectRetain(id)",
    },
    // Allocating global objects
    SignatureEntry {
        symbol: "___swift_allocate_value_buffer",
        prototype: "void *__fastcall __swift_allocate_value_buffer(void *typeInfo, void **pObject)",
    },
    SignatureEntry {
        symbol: "___swift_project_value_buffer",
        prototype: "__int64 __fastcall __swift_project_value_buffer(void *typeInfo, void *object)",
    },
    // String operations
    SignatureEntry {
        symbol: "_$ss27_stringCompareWithSmolCheck__9expectingSbs11_StringGutsV_ADs01_G16ComparisonResultOtF",
        prototype: "__int64 __fastcall _stringCompareWithSmolCheck_____expecting__(Swift::String, Swift::String, _QWORD)",
    },
    SignatureEntry {
        symbol: "_$sSS9hasPrefixySbSSF",
        prototype: "Swift::Bool __swiftcall String_hasPrefix____(Swift::String, Swift::String)",
    },
    SignatureEntry {
        symbol: "_$sSS12ProxymanCoreE5toSHASSSgyF",
        prototype: "Swift::String_optional __swiftcall String_toSHA__(Swift::String)",
    },
    SignatureEntry {
        symbol: "_$sSy10FoundationE4data5using20allowLossyConversionAA4DataVSgSSAAE8EncodingV_SbtF",
        prototype: "Swift::String __fastcall StringProtocol_data_using_allowLossyConversion__(_QWORD, _QWORD, _QWORD, _QWORD);",
    },
    SignatureEntry {
        symbol: "_$sSS5countSivg",
        prototype: "__int64 __usercall String_count_getter@<X0>(void *@<X20>, Swift::String@<X0:X1>)",
    },
    SignatureEntry {
        symbol: "_$sSS10FoundationE10contentsOf8encodingSSAA3URLVh_SSAAE8EncodingVtKcfC",
        prototype: "Swift::String __usercall __spoils<X21> String_init_contentsOf_encoding__@<X0:X1>(Swift::String@<X0:X1>)",
    },
    // Data operations
    SignatureEntry {
        symbol: "_$s10Foundation4DataV19_bridgeToObjectiveCSo6NSDataCyF",
        prototype: "NSData __swiftcall Data__bridgeToObjectiveC__(Swift::String)",
    },
    SignatureEntry {
        symbol: "_$s10Foundation4DataV11referencingACSo6NSDataCh_tcfC",
        prototype: "Swift::String __fastcall Data_init_referencing__(_QWORD)",
    },
    // String interpolation
    SignatureEntry {
        symbol: "_$ss26DefaultStringInterpolationV13appendLiteralyySSF",
        prototype: "Swift::Void __usercall DefaultStringInterpolation_appendLiteral____(void *@<X20>, Swift::String@<X0:X1>)",
    },
    SignatureEntry {
        symbol: "_$ss26DefaultStringInterpolationV06appendC0yyxlF",
        prototype: "Swift::Void __usercall DefaultStringInterpolation_appendInterpolation_A(void *@<X20>, Swift::String@<X0:X1>)",
    },
    SignatureEntry {
        symbol: "_$ss26DefaultStringInterpolationV15literalCapacity18interpolationCountABSi_SitcfC",
        prototype: "Swift::String __fastcall DefaultStringInterpolation_init_literalCapacity_interpolationCount__(_QWORD, _QWORD)",
    },
    SignatureEntry {
        symbol: "_$sSS19stringInterpolationSSs013DefaultStringB0V_tcfC",
        prototype: "Swift::String __fastcall String_init_stringInterpolation__(Swift::String)",
    },
];

/// Host capability: mangled/runtime symbol name to code address.
pub trait SymbolResolver {
    fn resolve(&self, name: &str) -> Option<u64>;
}

/// Host capability: type declaration parsing and prototype application.
pub trait TypeApplier {
    /// Declare auxiliary types once, before any prototypes are applied.
    fn declare_types(&mut self, decls: &str);

    /// Apply `prototype` at `addr`. Returns `false` when the host rejects
    /// the prototype.
    fn apply(&mut self, addr: u64, prototype: &str) -> bool;
}

/// Counts from one catalog application pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppliedSignatures {
    pub applied: usize,
    /// Symbols the resolver did not know. Expected for any binary that does
    /// not link all of Foundation; not an error.
    pub skipped: usize,
    pub rejected: usize,
}

/// Declare the auxiliary types, then apply every catalog prototype whose
/// symbol resolves.
pub fn apply_signatures(
    resolver: &dyn SymbolResolver,
    applier: &mut dyn TypeApplier,
) -> AppliedSignatures {
    applier.declare_types(SWIFT_DECLS);

    let mut counts = AppliedSignatures::default();
    for entry in SIGNATURES {
        match resolver.resolve(entry.symbol) {
            Some(addr) => {
                if applier.apply(addr, entry.prototype) {
                    counts.applied += 1;
                } else {
                    debug!(symbol = entry.symbol, "host rejected prototype");
                    counts.rejected += 1;
                }
            }
            None => {
                counts.skipped += 1;
            }
        }
    }
    counts
}
