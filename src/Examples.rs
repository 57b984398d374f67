/// runs the smoke checks of the pair Green's function with parameters from GFSettings
pub mod gf_examples;
