use serde::{Deserialize, Serialize};

/// Static description of a single trace column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    /// Fully qualified name, e.g. `mxp.ACC_1`.
    pub name: &'static str,
    /// Width of one cell in bytes.
    pub width: usize,
}

impl ColumnDef {
    pub fn header(&self, length: usize) -> ColumnHeader {
        ColumnHeader {
            name: self.name.to_string(),
            width: self.width,
            length,
        }
    }
}

/// Layout of one column file region, as listed in the companion header file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub name: String,
    pub width: usize,
    pub length: usize,
}

impl ColumnHeader {
    /// Size in bytes of the column region.
    pub fn byte_len(&self) -> usize {
        self.width * self.length
    }
}

/// The ordered set of columns of one module.
///
/// Implemented by the enums generated with [`declare_columns!`](crate::declare_columns).
pub trait ColumnSet: Copy {
    const MODULE: &'static str;
    const DEFS: &'static [ColumnDef];

    fn index(self) -> usize;

    fn def(self) -> &'static ColumnDef {
        &Self::DEFS[self.index()]
    }

    fn headers(length: usize) -> Vec<ColumnHeader> {
        Self::DEFS.iter().map(|def| def.header(length)).collect()
    }
}

/// Declares the columns of a module as a `#[repr(usize)]` enum along with
/// its [`ColumnSet`] implementation. Column order is declaration order.
#[macro_export]
macro_rules! declare_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $module:literal {
            $($variant:ident => $column:literal : $width:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(usize)]
        $vis enum $name {
            $($variant),*
        }

        impl $crate::trace::ColumnSet for $name {
            const MODULE: &'static str = $module;
            const DEFS: &'static [$crate::trace::ColumnDef] = &[
                $($crate::trace::ColumnDef {
                    name: concat!($module, ".", $column),
                    width: $width,
                }),*
            ];

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::declare_columns! {
        enum Sample in "sample" {
            Stamp => "STAMP": 4,
            Flag => "FLAG": 1,
        }
    }

    #[test]
    fn declared_columns_keep_order_and_names() {
        assert_eq!(Sample::DEFS.len(), 2);
        assert_eq!(Sample::Flag.index(), 1);
        assert_eq!(Sample::Stamp.def().name, "sample.STAMP");
        assert_eq!(
            Sample::headers(3),
            vec![
                ColumnHeader {
                    name: "sample.STAMP".into(),
                    width: 4,
                    length: 3
                },
                ColumnHeader {
                    name: "sample.FLAG".into(),
                    width: 1,
                    length: 3
                },
            ]
        );
    }
}
