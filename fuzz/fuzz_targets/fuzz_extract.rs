#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = facturx_embed::facturx::extract_attachment(data, "facturx.xml");
});
