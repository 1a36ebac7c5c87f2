use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use relay_notify::{ChangeEvent, DeliveryMode, PropertyChanged};
use relay_sync::CancellationToken;

use super::ObservableList;
use crate::{ListConfig, ListError};

fn inline_list(items: Vec<u32>) -> Arc<ObservableList<u32>> {
	Arc::new(ObservableList::from_vec(items, ListConfig::default().with_delivery(DeliveryMode::Inline)))
}

fn event_log(list: &ObservableList<u32>) -> Arc<Mutex<Vec<ChangeEvent<u32>>>> {
	let log = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&log);
	list.bus().subscribe_collection(move |event| sink.lock().push(event.clone()));
	log
}

/// Holds a read lock on a plain thread until the returned sender fires or drops.
fn hold_read(list: &Arc<ObservableList<u32>>) -> (mpsc::Sender<()>, thread::JoinHandle<()>) {
	let (entered_tx, entered_rx) = mpsc::channel();
	let (release_tx, release_rx) = mpsc::channel::<()>();
	let list = Arc::clone(list);
	let handle = thread::spawn(move || {
		list.read(|_| {
			let _ = entered_tx.send(());
			let _ = release_rx.recv();
		})
		.expect("holder acquires");
	});
	entered_rx.recv().expect("holder entered");
	(release_tx, handle)
}

#[tokio::test]
async fn async_operations_mirror_blocking_ones() {
	let list = inline_list(vec![1, 2]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();

	assert_eq!(list.append_async(vec![3, 4], &cancel).await, Ok(Some(2)));
	assert_eq!(list.push_async(5, &cancel).await, Ok(4));
	list.insert_async(0, vec![0], &cancel).await.expect("insert");
	list.set_async(1, 10, &cancel).await.expect("set");
	assert_eq!(list.get_async(1, &cancel).await, Ok(10));
	assert_eq!(list.len_async(&cancel).await, Ok(6));
	assert_eq!(list.contains_async(&4, &cancel).await, Ok(true));
	assert_eq!(list.index_of_async(&5, &cancel).await, Ok(Some(5)));
	assert_eq!(list.remove_at_async(0, &cancel).await, Ok(0));
	assert_eq!(list.remove_async(&10, &cancel).await, Ok(Some(0)));
	assert_eq!(list.remove_async(&10, &cancel).await, Ok(None));
	assert_eq!(list.snapshot_async(&cancel).await, Ok(vec![2, 3, 4, 5]));

	let mut dest = [0; 4];
	assert_eq!(list.copy_to_async(&mut dest, 0, &cancel).await, Ok(4));
	assert_eq!(dest, [2, 3, 4, 5]);

	let removed = list.remove_where_async(|v| v % 2 == 0, &cancel).await.expect("remove_where");
	assert_eq!(removed.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
	list.clear_async(&cancel).await.expect("clear");
	assert_eq!(list.len_async(&cancel).await, Ok(0));

	assert_eq!(
		*log.lock(),
		vec![
			ChangeEvent::Insert { index: 2, items: vec![3, 4] },
			ChangeEvent::Insert { index: 4, items: vec![5] },
			ChangeEvent::Insert { index: 0, items: vec![0] },
			ChangeEvent::Replace { index: 1, value: 10 },
			ChangeEvent::RemoveRange { start: 0, values: vec![0] },
			ChangeEvent::RemoveRange { start: 0, values: vec![10] },
			ChangeEvent::Reset,
			ChangeEvent::Reset,
		]
	);
}

#[tokio::test]
async fn async_remove_at_on_empty_list_fails() {
	let list = inline_list(Vec::new());
	let log = event_log(&list);
	let cancel = CancellationToken::new();
	assert_eq!(list.remove_at_async(0, &cancel).await, Err(ListError::IndexOutOfRange { index: 0, len: 0 }));
	assert!(log.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_writer_changes_nothing() {
	let list = inline_list(vec![1, 2, 3]);
	let log = event_log(&list);
	let (release, holder) = hold_read(&list);
	let cancel = CancellationToken::new();

	let pending = {
		let list = Arc::clone(&list);
		let cancel = cancel.clone();
		tokio::spawn(async move { list.clear_async(&cancel).await })
	};
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(!pending.is_finished(), "writer should wait for the reader");

	cancel.cancel();
	assert_eq!(pending.await.expect("task"), Err(ListError::Cancelled));

	drop(release);
	holder.join().expect("holder thread");
	assert_eq!(list.snapshot(), Ok(vec![1, 2, 3]));
	assert!(log.lock().is_empty());

	// The lock is not poisoned.
	let fresh = CancellationToken::new();
	assert_eq!(list.push_async(4, &fresh).await, Ok(3));
	assert_eq!(*log.lock(), vec![ChangeEvent::Insert { index: 3, items: vec![4] }]);
}

#[tokio::test]
async fn precancelled_token_fails_reads_and_writes() {
	let list = inline_list(vec![1]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();
	cancel.cancel();

	assert_eq!(list.get_async(0, &cancel).await, Err(ListError::Cancelled));
	assert_eq!(list.append_async(vec![2], &cancel).await, Err(ListError::Cancelled));
	assert_eq!(list.remove_where_async(|_| true, &cancel).await, Err(ListError::Cancelled));
	assert_eq!(list.snapshot(), Ok(vec![1]));
	assert!(log.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_async_appends_receive_distinct_indices() {
	let list = Arc::new(ObservableList::<u32>::new());
	let tasks: Vec<_> = (0..32)
		.map(|n| {
			let list = Arc::clone(&list);
			tokio::spawn(async move { list.push_async(n, &CancellationToken::new()).await })
		})
		.collect();
	let mut indices = Vec::new();
	for task in tasks {
		indices.push(task.await.expect("task").expect("push"));
	}
	indices.sort_unstable();
	assert_eq!(indices, (0..32).collect::<Vec<usize>>());
}

#[derive(Debug, PartialEq, Eq)]
enum AppError {
	Source(&'static str),
	List(ListError),
}

impl From<ListError> for AppError {
	fn from(err: ListError) -> Self {
		Self::List(err)
	}
}

#[tokio::test]
async fn deferred_inputs_resolve_before_locking() {
	let list = inline_list(vec![1, 2, 3]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();

	let set = list.set_deferred(async { Ok::<_, AppError>(0) }, async { Ok(9) }, &cancel).await;
	assert_eq!(set, Ok(()));
	assert_eq!(list.get_deferred(async { Ok::<_, AppError>(0) }, &cancel).await, Ok(9));
	assert_eq!(list.append_deferred(async { Ok::<_, AppError>(Some(vec![4])) }, &cancel).await, Ok(Some(3)));
	assert_eq!(list.contains_deferred(async { Ok::<_, AppError>(4) }, &cancel).await, Ok(true));
	assert_eq!(list.index_of_deferred(async { Ok::<_, AppError>(3) }, &cancel).await, Ok(Some(2)));
	assert_eq!(list.remove_deferred(async { Ok::<_, AppError>(2) }, &cancel).await, Ok(Some(1)));
	assert_eq!(list.remove_at_deferred(async { Ok::<_, AppError>(0) }, &cancel).await, Ok(9));
	list.insert_deferred(async { Ok::<_, AppError>(0) }, async { Ok(Some([7, 8])) }, &cancel)
		.await
		.expect("insert");
	assert_eq!(list.snapshot(), Ok(vec![7, 8, 3, 4]));
	assert_eq!(log.lock().len(), 5);
}

#[tokio::test]
async fn failing_input_propagates_unchanged() {
	let list = inline_list(vec![1, 2, 3]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();

	let res = list
		.set_deferred(async { Ok(0) }, async { Err::<u32, _>(AppError::Source("value unavailable")) }, &cancel)
		.await;
	assert_eq!(res, Err(AppError::Source("value unavailable")));

	let res = list.remove_at_deferred(async { Err::<usize, _>(AppError::Source("no index")) }, &cancel).await;
	assert_eq!(res, Err(AppError::Source("no index")));

	assert_eq!(list.snapshot(), Ok(vec![1, 2, 3]));
	assert!(log.lock().is_empty());
}

#[tokio::test]
async fn list_failure_is_converted_for_deferred_callers() {
	let list = inline_list(vec![1]);
	let cancel = CancellationToken::new();
	let res = list.get_deferred(async { Ok::<_, AppError>(4) }, &cancel).await;
	assert_eq!(res, Err(AppError::List(ListError::IndexOutOfRange { index: 4, len: 1 })));
}

#[tokio::test]
async fn absent_deferred_items_are_no_ops() {
	let list = inline_list(vec![1]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();
	assert_eq!(list.append_deferred(async { Ok::<Option<Vec<u32>>, AppError>(None) }, &cancel).await, Ok(None));
	assert_eq!(
		list.insert_deferred(async { Ok::<_, AppError>(0) }, async { Ok::<Option<Vec<u32>>, _>(None) }, &cancel)
			.await,
		Ok(())
	);
	assert!(log.lock().is_empty());
}

#[tokio::test]
async fn detached_delivery_keeps_mutation_order() {
	let list = ObservableList::<u32>::new();
	let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
	{
		let tx = tx.clone();
		list.bus().subscribe_collection(move |event| {
			let _ = tx.send(format!("{:?}", event.kind()));
		});
	}
	list.bus().subscribe_property(move |event: &PropertyChanged| {
		let _ = tx.send(event.name.to_string());
	});

	let cancel = CancellationToken::new();
	list.push_async(1, &cancel).await.expect("push");
	list.insert_async(0, vec![7, 8], &cancel).await.expect("insert");
	list.remove_where_async(|_| true, &cancel).await.expect("remove all");
	let mut seen = Vec::new();
	for _ in 0..6 {
		let next = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.expect("delivered");
		seen.push(next.expect("channel open"));
	}
	assert_eq!(seen, ["Insert", "Count", "Insert", "Count", "Reset", "Count"]);
}

#[tokio::test]
async fn async_comparer_forms_use_supplied_equality() {
	let list = inline_list(vec![10, 21, 30]);
	let log = event_log(&list);
	let cancel = CancellationToken::new();
	let same_parity = |a: &u32, b: &u32| a % 2 == b % 2;

	assert_eq!(list.is_empty_async(&cancel).await, Ok(false));
	assert_eq!(list.contains_by_async(&1, same_parity, &cancel).await, Ok(true));
	assert_eq!(list.index_of_by_async(&1, same_parity, &cancel).await, Ok(Some(1)));
	assert_eq!(list.remove_by_async(&1, same_parity, &cancel).await, Ok(Some(1)));
	assert_eq!(list.iter_async(&cancel).await.map(|items| items.collect::<Vec<_>>()), Ok(vec![10, 30]));
	assert_eq!(*log.lock(), vec![ChangeEvent::RemoveRange { start: 1, values: vec![21] }]);
}
