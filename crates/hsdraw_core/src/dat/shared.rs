use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dat::Blob;

/// Cloneable single-writer handle to one [`Blob`].
///
/// Queries take the read side; `patch`, `insert`, and `remove` need the write
/// side, so no reader observes a blob mid-resize. A poisoned lock is recovered
/// rather than propagated.
#[derive(Clone)]
pub struct SharedBlob {
	inner: Arc<RwLock<Blob>>,
}

impl SharedBlob {
	/// Take ownership of `blob`.
	pub fn new(blob: Blob) -> Self {
		Self {
			inner: Arc::new(RwLock::new(blob)),
		}
	}

	/// Shared access for queries.
	pub fn read(&self) -> RwLockReadGuard<'_, Blob> {
		match self.inner.read() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	/// Exclusive access for mutation and lazy resolution.
	pub fn write(&self) -> RwLockWriteGuard<'_, Blob> {
		match self.inner.write() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	/// Run `f` under the read lock.
	pub fn with_read<T>(&self, f: impl FnOnce(&Blob) -> T) -> T {
		f(&self.read())
	}

	/// Run `f` under the write lock.
	pub fn with_write<T>(&self, f: impl FnOnce(&mut Blob) -> T) -> T {
		f(&mut self.write())
	}
}

#[cfg(test)]
mod tests {
	use hsdraw_testkit::model_builder;

	use crate::dat::{Blob, LoadOptions, SharedBlob};

	#[test]
	fn readers_see_whole_resizes() {
		let blob = Blob::from_bytes(&model_builder().build(), &LoadOptions::default()).expect("blob parses");
		let shared = SharedBlob::new(blob);

		std::thread::scope(|scope| {
			for _ in 0..4 {
				let shared = shared.clone();
				scope.spawn(move || {
					for _ in 0..16 {
						shared.with_read(|blob| {
							let len = blob.data().len() as u32;
							assert_eq!(blob.header().relocation_table_start, len);
							assert!(blob.relocations().pointers().iter().all(|pointer| pointer.location < len));
						});
					}
				});
			}
			scope.spawn(|| {
				for _ in 0..8 {
					shared.with_write(|blob| blob.insert(0x40, 0x20)).expect("insert succeeds");
				}
			});
		});

		assert_eq!(shared.read().generation(), 8);
		assert_eq!(shared.read().data().len(), 0x180 + 8 * 0x20);
	}
}
