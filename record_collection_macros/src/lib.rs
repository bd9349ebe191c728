mod record;

use proc_macro::TokenStream;

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "users")]
/// struct User {
///     #[record(primary_key)]
///     pub user_id: i64,
///     pub name: String,
///     pub role: String,
/// }
/// ```
///
/// - `#[record(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[record(primary_key)]` marks the field holding the primary key; its
///   name becomes `Record::PRIMARY_KEY`. If omitted, the field named `id` is used.
///
/// The key field's type must convert into `PrimaryKey` (`String`, `&str`,
/// `i64`, `i32`, `u32`).
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
