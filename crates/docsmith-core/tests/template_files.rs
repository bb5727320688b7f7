use docsmith_core::ErrorKind;
use docsmith_core::template_files::{
    modified_download_name, original_download_name, pdf_file_name, template_file_name,
    template_path_segment, template_stem, validate_template_id,
};

#[test]
fn stem_and_file_name_are_interchangeable() {
    assert_eq!(template_stem("standard_invoice.fo.vm"), "standard_invoice");
    assert_eq!(template_stem("standard_invoice"), "standard_invoice");
    assert_eq!(template_file_name("standard_invoice"), "standard_invoice.fo.vm");
    assert_eq!(template_file_name("standard_invoice.fo.vm"), "standard_invoice.fo.vm");
}

#[test]
fn download_names_never_double_the_extension() {
    assert_eq!(
        modified_download_name("akg-b2b-invoice.fo.vm"),
        "modified_akg-b2b-invoice.fo.vm"
    );
    assert_eq!(original_download_name("oto_box_label"), "oto_box_label.fo.vm");
    assert_eq!(pdf_file_name("oto_box_label.fo.vm"), "oto_box_label.pdf");
}

#[test]
fn plain_ids_are_valid() {
    assert!(validate_template_id("nykaa_invoice_template").is_ok());
    assert!(validate_template_id("uspl-einvoice-template.fo.vm").is_ok());
}

#[test]
fn ids_that_escape_a_path_segment_are_rejected() {
    for bad in ["", "   ", ".fo.vm", "../secrets", "a/b", "a\\b", "..", "x?y=1", " padded "] {
        let err = validate_template_id(bad).expect_err(bad);
        assert_eq!(err.kind(), ErrorKind::ValidationFailure, "{bad:?}");
    }
}

#[test]
fn path_segments_are_percent_encoded() {
    assert_eq!(template_path_segment("standard_invoice"), "standard_invoice.fo.vm");
    assert_eq!(template_path_segment("box label.fo.vm"), "box%20label.fo.vm");
    assert_eq!(template_path_segment("façade"), "fa%C3%A7ade.fo.vm");
}
