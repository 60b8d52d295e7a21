use crate::reader::Endian;
use crate::FunctionSignature;
use anyhow::Result;
use gimli::{BaseAddresses, EhFrame, RunTimeEndian, UnwindSection};

pub fn parse_eh_frame(
    data: &[u8],
    base_address: u64,
    endian: Endian,
    address_size: u8,
) -> Result<Vec<FunctionSignature>> {
    let endian = match endian {
        Endian::Little => RunTimeEndian::Little,
        Endian::Big => RunTimeEndian::Big,
    };
    let mut signatures = Vec::new();
    let mut eh_frame = EhFrame::new(data, endian);
    eh_frame.set_address_size(address_size);
    let bases = BaseAddresses::default().set_eh_frame(base_address);

    let mut entries = eh_frame.entries(&bases);
    while let Some(entry) = entries.next()? {
        if let gimli::CieOrFde::Fde(partial_fde) = entry {
            match partial_fde.parse(|_, bases, o| eh_frame.cie_from_offset(bases, o)) {
                Ok(fde) => {
                    let start = fde.initial_address();
                    let size = fde.len();
                    signatures.push(FunctionSignature {
                        function_identifier: format!("FUNC_{:#x}", start),
                        start,
                        end: start.wrapping_add(size),
                        size,
                    });
                }
                Err(err) => log::debug!("skipping unparsable FDE: {err}"),
            }
        }
    }

    signatures.sort_by_key(|sig| sig.start);
    Ok(signatures)
}
