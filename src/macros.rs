/// Builds a [`LoopTable`](crate::LoopTable) from literal rules.
///
/// Each rule is `(loop name, segment, level, context)`; the loop name is a
/// string literal (`"."` for an anonymous frame) or `None`.
///
/// ```rust
/// use edi_stream::loop_table;
///
/// let table = loop_table![
///     ("N1", "N1", 1, "*"),
///     (None, "CTT", 0, "*"),
/// ];
/// assert_eq!(table.len(), 2);
/// ```
#[macro_export]
macro_rules! loop_table {
    (@name None) => {
        ::core::option::Option::None
    };

    (@name $name:literal) => {
        ::core::option::Option::Some($name)
    };

    () => {
        $crate::LoopTable::new()
    };

    ($( ($name:tt, $segment:expr, $level:expr, $context:expr) ),+ $(,)?) => {{
        let mut table = $crate::LoopTable::new();
        $(
            table.push($crate::LoopDescriptor::new(
                $crate::loop_table!(@name $name),
                $segment,
                $level,
                $context,
            ));
        )+
        table
    }};
}
