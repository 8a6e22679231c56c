#![allow(missing_docs)]

pub(crate) mod backend;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;
pub(crate) mod multipart;

pub(crate) use backend::spawn_fake_backend;
pub(crate) use form::{
    assert_form_input, assert_form_submit_button, assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_status_ok, get_header};
pub(crate) use multipart::{
    MultipartPart, multipart_body, multipart_content_type, must_make_multipart,
};
