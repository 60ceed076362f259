use super::events::{
    stamp_typing, ClientMessage, ServerMessage, Topic, STATUS_CLOSED, STATUS_ERROR,
    STATUS_SUBSCRIBED,
};
use super::hub::RealtimeHub;
use crate::configuration::Settings;
use crate::db;
use crate::models;
use actix::fut::{wrap_stream, ActorStreamExt};
use actix::{Actor, ActorContext, AsyncContext, Handler, SpawnHandle, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Topics of one connection. A topic is pending while its access check runs
/// and active once its stream is attached.
#[derive(Debug)]
struct Subscriptions<H> {
    pending: HashSet<String>,
    active: HashMap<String, H>,
}

impl<H> Default for Subscriptions<H> {
    fn default() -> Self {
        Self {
            pending: HashSet::new(),
            active: HashMap::new(),
        }
    }
}

impl<H> Subscriptions<H> {
    /// Marks `topic` pending; false when it is already pending or active.
    fn begin(&mut self, topic: &str) -> bool {
        if self.pending.contains(topic) || self.active.contains_key(topic) {
            return false;
        }
        self.pending.insert(topic.to_string())
    }

    /// True when the finished check still has a pending request to answer.
    fn checked(&mut self, topic: &str) -> bool {
        self.pending.remove(topic) && !self.active.contains_key(topic)
    }

    fn activate(&mut self, topic: String, handle: H) {
        self.active.insert(topic, handle);
    }

    /// Forgets `topic`, returning its stream handle when one was attached.
    fn cancel(&mut self, topic: &str) -> Option<H> {
        self.pending.remove(topic);
        self.active.remove(topic)
    }

    fn is_active(&self, topic: &str) -> bool {
        self.active.contains_key(topic)
    }

    fn len(&self) -> usize {
        self.active.len()
    }
}

/// One websocket connection and the topics it listens to.
pub struct RealtimeSession {
    id: Uuid,
    user: Arc<models::User>,
    hub: Arc<RealtimeHub>,
    pg_pool: PgPool,
    subscriptions: Subscriptions<SpawnHandle>,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    hb: Instant,
}

impl RealtimeSession {
    pub fn new(
        user: Arc<models::User>,
        hub: Arc<RealtimeHub>,
        pg_pool: PgPool,
        settings: &Settings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            hub,
            pg_pool,
            subscriptions: Subscriptions::default(),
            heartbeat_interval: Duration::from_secs(settings.realtime.heartbeat_interval_secs),
            client_timeout: Duration::from_secs(settings.realtime.client_timeout_secs),
            hb: Instant::now(),
        }
    }

    /// Ping the client and drop it once it stops answering
    fn hb(&self, ctx: &mut <Self as Actor>::Context) {
        let timeout = self.client_timeout;
        ctx.run_interval(self.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!("Realtime client {} heartbeat failed, disconnecting", act.id);
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn send(ctx: &mut <Self as Actor>::Context, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(err) => tracing::error!("Failed to serialize realtime frame: {:?}", err),
        }
    }

    fn handle_client_message(&mut self, message: ClientMessage, ctx: &mut <Self as Actor>::Context) {
        match message {
            ClientMessage::Subscribe { topic } => {
                if self.subscriptions.is_active(&topic) {
                    Self::send(ctx, &ServerMessage::system(STATUS_SUBSCRIBED, Some(&topic), None));
                    return;
                }
                let Some(parsed) = Topic::parse(&topic) else {
                    Self::send(
                        ctx,
                        &ServerMessage::system(STATUS_ERROR, Some(&topic), Some("unknown topic".into())),
                    );
                    return;
                };
                if !self.subscriptions.begin(&topic) {
                    return;
                }

                let user = self.user.clone();
                let pg_pool = self.pg_pool.clone();
                let addr = ctx.address();
                actix::spawn(async move {
                    let allowed = can_subscribe(&pg_pool, &user, parsed).await;
                    addr.do_send(SubscriptionChecked { topic, allowed });
                });
            }
            ClientMessage::Unsubscribe { topic } => {
                if let Some(handle) = self.subscriptions.cancel(&topic) {
                    ctx.cancel_future(handle);
                }
                Self::send(ctx, &ServerMessage::system(STATUS_CLOSED, Some(&topic), None));
            }
            ClientMessage::Broadcast {
                topic,
                event,
                payload,
            } => {
                if !self.subscriptions.is_active(&topic) {
                    tracing::debug!("Dropping broadcast to unsubscribed topic {}", topic);
                    return;
                }
                let payload = stamp_typing(&event, payload, self.user.is_admin());
                self.hub.publish(ServerMessage::Broadcast {
                    topic,
                    event,
                    payload,
                });
            }
        }
    }
}

/// Admins may listen to anything in their organization, customers only to their own tickets.
async fn can_subscribe(pg_pool: &PgPool, user: &models::User, topic: Topic) -> Result<bool, String> {
    match topic {
        Topic::Organization(organization_id) => {
            Ok(user.is_admin() && organization_id == user.organization_id)
        }
        Topic::Ticket(ticket_id) => {
            let owner = db::ticket::fetch_owner(pg_pool, ticket_id).await?;
            Ok(match owner {
                Some((organization_id, customer_id)) => {
                    organization_id == user.organization_id
                        && (user.is_admin() || customer_id == user.id)
                }
                None => false,
            })
        }
    }
}

impl Actor for RealtimeSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            "Realtime connection started: session_id={}, user={}",
            self.id,
            self.user.id
        );
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "Realtime connection closed: session_id={}, topics={}",
            self.id,
            self.subscriptions.len()
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RealtimeSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => self.handle_client_message(message, ctx),
                    Err(err) => {
                        tracing::debug!("Unparseable realtime frame: {}", err);
                        Self::send(
                            ctx,
                            &ServerMessage::system(STATUS_ERROR, None, Some(err.to_string())),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary frames are not supported on the realtime channel");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                tracing::warn!("Realtime protocol error: {:?}", err);
                ctx.stop();
            }
            _ => {}
        }
    }
}

#[derive(actix::Message)]
#[rtype(result = "()")]
struct SubscriptionChecked {
    topic: String,
    allowed: Result<bool, String>,
}

impl Handler<SubscriptionChecked> for RealtimeSession {
    type Result = ();

    fn handle(&mut self, msg: SubscriptionChecked, ctx: &mut Self::Context) {
        // unsubscribed while the check ran
        if !self.subscriptions.checked(&msg.topic) {
            return;
        }
        match msg.allowed {
            Ok(true) => {}
            Ok(false) => {
                Self::send(
                    ctx,
                    &ServerMessage::system(STATUS_ERROR, Some(&msg.topic), Some("forbidden".into())),
                );
                return;
            }
            Err(err) => {
                Self::send(ctx, &ServerMessage::system(STATUS_ERROR, Some(&msg.topic), Some(err)));
                return;
            }
        }

        let topic = msg.topic.clone();
        let stream = BroadcastStream::new(self.hub.subscribe(&msg.topic)).filter_map(move |item| {
            match item {
                Ok(message) => Some(message),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("Realtime subscriber on {} skipped {} events", topic, skipped);
                    None
                }
            }
        });
        let forward = wrap_stream::<_, Self>(stream)
            .map(|message, _act, ctx| Self::send(ctx, &message))
            .finish();
        let handle = ctx.spawn(forward);
        self.subscriptions.activate(msg.topic.clone(), handle);
        Self::send(ctx, &ServerMessage::system(STATUS_SUBSCRIBED, Some(&msg.topic), None));
    }
}

/// GET /api/realtime, upgraded to a websocket
#[tracing::instrument(name = "Realtime websocket connection", skip(req, stream, user, hub, pg_pool, settings))]
#[get("")]
pub async fn realtime_websocket(
    req: HttpRequest,
    stream: web::Payload,
    user: web::ReqData<Arc<models::User>>,
    hub: web::Data<Arc<RealtimeHub>>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, Error> {
    tracing::info!("New realtime connection request from user: {}", user.id);

    let session = RealtimeSession::new(
        user.into_inner(),
        hub.get_ref().clone(),
        pg_pool.get_ref().clone(),
        settings.get_ref(),
    );

    ws::start(session, &req, stream)
}
