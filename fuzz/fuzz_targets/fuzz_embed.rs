#![no_main]

use libfuzzer_sys::fuzz_target;

const INVOICE: &[u8] = b"<Invoice/>";

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as PDF input must not panic.
    let _ = facturx_embed::facturx::embed_in_pdf(data, INVOICE, &Default::default());
});
