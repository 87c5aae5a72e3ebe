use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use super::*;

type Reply = std::result::Result<Option<String>, TransportError>;

/// Transport whose calls complete only when the test releases them.
#[derive(Default)]
struct GatedTransport {
    pending: Mutex<HashMap<String, Vec<oneshot::Receiver<Reply>>>>,
}

impl GatedTransport {
    /// Prepare the next call for `key` and return its release handle
    fn gate(&self, key: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(rx);
        tx
    }

    fn take(&self, key: &str) -> oneshot::Receiver<Reply> {
        let mut pending = self.pending.lock().unwrap();
        let queue = pending.get_mut(key).expect("call was not gated");
        queue.remove(0)
    }
}

impl Transport for GatedTransport {
    fn download_mpack(&self, name: &str, _url: &str) -> BoxFuture<'static, std::result::Result<MpackResource, TransportError>> {
        let rx = self.take(name);
        async move {
            match rx.await {
                Ok(reply) => reply.map(|resource_id| MpackResource { resource_id }),
                Err(_) => Err(TransportError::network("dropped")),
            }
        }
        .boxed()
    }

    fn verify_repo(&self, repo: &RepoCheck) -> BoxFuture<'static, std::result::Result<(), TransportError>> {
        let rx = self.take(&repo.repo_id);
        async move {
            match rx.await {
                Ok(reply) => reply.map(|_| ()),
                Err(_) => Err(TransportError::network("dropped")),
            }
        }
        .boxed()
    }
}

fn download(name: &str) -> (String, ProvisionTarget) {
    (
        name.to_string(),
        ProvisionTarget::DownloadMpack {
            name: name.to_string(),
            url: format!("http://repo.example.com/{name}.tar.gz"),
        },
    )
}

fn setup() -> (Arc<GatedTransport>, ProvisioningOrchestrator) {
    let transport = Arc::new(GatedTransport::default());
    let orchestrator = ProvisioningOrchestrator::new(transport.clone());
    (transport, orchestrator)
}

#[tokio::test]
async fn test_launch_starts_in_progress() {
    let (transport, mut orch) = setup();
    let _a = transport.gate("A");
    let _b = transport.gate("B");

    let tickets = orch.launch([download("A"), download("B")]).unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(orch.items().iter().all(|i| i.state == ProvisionState::InProgress));
    assert!(orch.items().iter().all(|i| i.generation == 1));
    assert!(!orch.can_advance());
}

#[tokio::test]
async fn test_gate_opens_when_all_succeed() {
    let (transport, mut orch) = setup();
    let a = transport.gate("A");
    let b = transport.gate("B");
    let c = transport.gate("C");
    orch.launch([download("A"), download("B"), download("C")]).unwrap();

    a.send(Ok(Some("1".to_string()))).unwrap();
    b.send(Ok(None)).unwrap();
    orch.next_settled().await.unwrap();
    orch.next_settled().await.unwrap();
    assert!(!orch.can_advance());

    c.send(Ok(None)).unwrap();
    assert_eq!(orch.next_settled().await.as_deref(), Some("C"));
    assert!(orch.can_advance());
    assert_eq!(orch.get("A").unwrap().resource_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_failure_blocks_until_retry_succeeds() {
    let (transport, mut orch) = setup();
    let a = transport.gate("A");
    let b = transport.gate("B");
    orch.launch([download("A"), download("B")]).unwrap();

    a.send(Ok(None)).unwrap();
    b.send(Err(TransportError::new(500, "Internal Server Error"))).unwrap();
    orch.settle_all().await;

    let failed = orch.get("B").unwrap();
    assert_eq!(failed.state, ProvisionState::Failed);
    assert_eq!(failed.failure.as_ref().unwrap().kind, FailureKind::ServerError);
    assert_eq!(failed.failure_message(), Some("Internal Server Error"));
    assert!(!orch.can_advance());

    let retry = transport.gate("B");
    let ticket = orch.retry("B").unwrap();
    assert_eq!(ticket.generation, 2);
    assert!(orch.get("B").unwrap().failure.is_none());
    assert!(!orch.can_advance());

    retry.send(Ok(None)).unwrap();
    let item = orch.wait_for(&ticket).await.unwrap();
    assert_eq!(item.state, ProvisionState::Succeeded);
    assert!(orch.can_advance());
}

#[tokio::test]
async fn test_conflict_counts_as_success() {
    let (transport, mut orch) = setup();
    let x = transport.gate("X");
    let ticket = orch.launch([download("X")]).unwrap().remove(0);

    x.send(Err(TransportError::new(409, "Conflict"))).unwrap();
    let item = orch.wait_for(&ticket).await.unwrap();
    assert_eq!(item.state, ProvisionState::Succeeded);
    assert!(item.failure.is_none());
    assert!(orch.can_advance());
}

#[tokio::test]
async fn test_failure_classification() {
    let (transport, mut orch) = setup();
    let a = transport.gate("A");
    let b = transport.gate("B");
    orch.launch([download("A"), download("B")]).unwrap();

    a.send(Err(TransportError::new(400, "Bad Request"))).unwrap();
    b.send(Err(TransportError::new(503, "Service Unavailable"))).unwrap();
    orch.settle_all().await;

    let a = orch.get("A").unwrap().failure.clone().unwrap();
    assert_eq!(a.kind, FailureKind::ClientError);
    assert_eq!(a.message, "Bad Request");

    let b = orch.get("B").unwrap().failure.clone().unwrap();
    assert_eq!(b.kind, FailureKind::Generic);
    assert_eq!(b.message, DEFAULT_FAILURE_MESSAGE);
    assert_eq!(orch.failed_items().count(), 2);
}

#[tokio::test]
async fn test_one_failure_does_not_cancel_others() {
    let (transport, mut orch) = setup();
    let a = transport.gate("A");
    let b = transport.gate("B");
    orch.launch([download("A"), download("B")]).unwrap();

    a.send(Err(TransportError::network("refused"))).unwrap();
    assert_eq!(orch.next_settled().await.as_deref(), Some("A"));
    assert_eq!(orch.get("B").unwrap().state, ProvisionState::InProgress);

    b.send(Ok(None)).unwrap();
    assert_eq!(orch.next_settled().await.as_deref(), Some("B"));
    assert_eq!(orch.get("B").unwrap().state, ProvisionState::Succeeded);
}

#[tokio::test]
async fn test_stale_settlement_is_discarded() {
    let (transport, mut orch) = setup();
    let first = transport.gate("A");
    orch.launch([download("A")]).unwrap();
    first.send(Err(TransportError::new(500, "Internal Server Error"))).unwrap();
    orch.settle_all().await;

    let _second = transport.gate("A");
    orch.retry("A").unwrap();

    let stale = Settlement {
        id: "A".to_string(),
        generation: 1,
        outcome: Ok(None),
    };
    assert!(!orch.apply(stale));
    assert_eq!(orch.get("A").unwrap().state, ProvisionState::InProgress);
    assert_eq!(orch.get("A").unwrap().generation, 2);
}

#[tokio::test]
async fn test_invalid_transitions() {
    let (transport, mut orch) = setup();
    let a = transport.gate("A");
    orch.launch([download("A")]).unwrap();

    assert_eq!(
        orch.start("A"),
        Err(ProvisionTransitionError::AlreadyInProgress("A".to_string()))
    );
    assert_eq!(
        orch.retry("A"),
        Err(ProvisionTransitionError::InvalidRetry {
            id: "A".to_string(),
            state: ProvisionState::InProgress,
        })
    );

    a.send(Ok(None)).unwrap();
    orch.settle_all().await;
    assert_eq!(
        orch.start("A"),
        Err(ProvisionTransitionError::AlreadySucceeded("A".to_string()))
    );
    assert_eq!(
        orch.retry("missing"),
        Err(ProvisionTransitionError::UnknownItem("missing".to_string()))
    );
    assert_eq!(
        orch.track("A", download("A").1),
        Err(ProvisionTransitionError::DuplicateItem("A".to_string()))
    );
}

#[tokio::test]
async fn test_errors_block_gate() {
    let (_transport, mut orch) = setup();
    assert!(orch.can_advance());

    orch.push_error("registry unavailable");
    assert!(!orch.can_advance());
    orch.clear_errors();
    assert!(orch.can_advance());
}

#[tokio::test]
async fn test_pending_item_blocks_gate() {
    let (_transport, mut orch) = setup();
    orch.track("A", download("A").1).unwrap();
    assert!(!orch.can_advance());
    assert_eq!(orch.next_settled().await, None);
}

#[tokio::test]
async fn test_verify_repo_items() {
    let (transport, mut orch) = setup();
    let gate = transport.gate("CORE-1.0");
    let target = ProvisionTarget::VerifyRepo(RepoCheck {
        repo_id: "CORE-1.0".to_string(),
        os_type: "redhat7".to_string(),
        url: "http://repo.example.com/core".to_string(),
    });
    orch.launch([("CORE-1.0.0-redhat7-CORE-1.0".to_string(), target)]).unwrap();

    gate.send(Ok(None)).unwrap();
    orch.settle_all().await;
    assert!(orch.can_advance());
}

#[tokio::test]
async fn test_poll_settled_does_not_wait() {
    let (transport, mut orch) = setup();
    let _a = transport.gate("A");
    orch.launch([download("A")]).unwrap();
    assert_eq!(orch.poll_settled(), 0);
    assert_eq!(orch.get("A").unwrap().state, ProvisionState::InProgress);
}
