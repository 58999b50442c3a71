mod backend;
mod host;
mod notify;
mod poller;
mod session;
mod store;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
