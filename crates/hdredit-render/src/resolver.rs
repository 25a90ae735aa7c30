//! Output color resolution.
//!
//! Previews and exports are always BT.2100: BT.2020 primaries and the
//! BT.2020 non-constant-luminance matrix. Only the transfer follows the
//! source, HLG for HLG sources and PQ for everything else.

use hdredit_core::ColorSpaceHint;
use hdredit_io::HdrColorInfo;
use hdredit_transfer::TransferFunction;

/// Resolves the output color for a source hint.
pub fn resolve(hint: Option<&ColorSpaceHint>) -> HdrColorInfo {
    let transfer = match hint {
        Some(h) if h.is_hlg() => TransferFunction::Hlg,
        _ => TransferFunction::Pq,
    };
    HdrColorInfo::bt2100(transfer)
}

/// Resolves from a free-form color space name, as found in legacy metadata.
pub fn resolve_name(name: Option<&str>) -> HdrColorInfo {
    let hint = name.map(ColorSpaceHint::from_name);
    resolve(hint.as_ref())
}
