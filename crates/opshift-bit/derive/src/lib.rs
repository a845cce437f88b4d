mod derive;

use proc_macro::TokenStream;

use crate::derive::handle_derive_key;

/// Derives `Bitable` and `Named` for a fieldless enum, which makes it a `Key`.
///
/// Variants get bits in declaration order and snake_case names:
/// `DriveForward` is named `drive_forward`.
#[proc_macro_derive(Key)]
pub fn derive_key(input: TokenStream) -> TokenStream {
    handle_derive_key(input)
}
