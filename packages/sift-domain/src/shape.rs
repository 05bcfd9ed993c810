use std::ops::{BitOr, BitOrAssign};

use crate::CriteriaError;

/// Which optional parts of an entity a hydration call populates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResponseGroup(u32);
impl ResponseGroup {
	pub const INFO: Self = Self(1);
	pub const PROPERTIES: Self = Self(1 << 1);
	pub const ASSETS: Self = Self(1 << 2);
	pub const SEO: Self = Self(1 << 3);
	pub const OUTLINES: Self = Self(1 << 4);
	/// Ancestor chain. Categories only.
	pub const PARENTS: Self = Self(1 << 5);
	pub const ITEM_LARGE: Self =
		Self(Self::INFO.0 | Self::PROPERTIES.0 | Self::ASSETS.0 | Self::SEO.0 | Self::OUTLINES.0);
	pub const CATEGORY_FULL: Self = Self(Self::ITEM_LARGE.0 | Self::PARENTS.0);

	const NAMES: [(&'static str, Self); 8] = [
		("info", Self::INFO),
		("properties", Self::PROPERTIES),
		("assets", Self::ASSETS),
		("seo", Self::SEO),
		("outlines", Self::OUTLINES),
		("parents", Self::PARENTS),
		("item_large", Self::ITEM_LARGE),
		("full", Self::CATEGORY_FULL),
	];

	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	pub const fn union(self, other: Self) -> Self {
		Self(self.0 | other.0)
	}

	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Parses group names case-insensitively. `INFO` is always included.
	pub fn from_names<S>(names: &[S]) -> Result<Self, CriteriaError>
	where
		S: AsRef<str>,
	{
		let mut group = Self::INFO;

		for name in names {
			let name = name.as_ref().trim();
			let Some((_, flag)) =
				Self::NAMES.iter().find(|(label, _)| label.eq_ignore_ascii_case(name))
			else {
				return Err(CriteriaError::UnknownResponseGroup { name: name.to_string() });
			};

			group |= *flag;
		}

		Ok(group)
	}
}
impl Default for ResponseGroup {
	fn default() -> Self {
		Self::INFO
	}
}
impl BitOr for ResponseGroup {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		self.union(rhs)
	}
}
impl BitOrAssign for ResponseGroup {
	fn bitor_assign(&mut self, rhs: Self) {
		*self = self.union(rhs);
	}
}
