/*!
 * Data Structures
 *
 * Small specialized types shared by the kernel:
 * - Inline strings for class names and short diagnostic text
 */

mod inline_string;

pub use inline_string::InlineString;
