/*
[INPUT]:  Symbol and product type
[OUTPUT]: Market data printed to stdout
[POS]:    Examples - public REST endpoints
[UPDATE]: When the market data API changes
*/

use bitget_adapter::RestClient;

/// Example: public market data over REST (no credentials required)
#[tokio::main]
async fn main() {
    let client = match RestClient::new() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("client init failed: {err}");
            return;
        }
    };

    match client.ticker("BTCUSDT", "USDT-FUTURES").await {
        Ok(tickers) => {
            for ticker in tickers {
                println!(
                    "{}: last={} mark={} funding={}",
                    ticker.symbol, ticker.last_pr, ticker.mark_price, ticker.funding_rate
                );
            }
        }
        Err(err) => eprintln!("ticker failed: {err}"),
    }

    match client.orderbook("BTCUSDT", "USDT-FUTURES", Some(5)).await {
        Ok(depth) => {
            println!("best ask: {:?}", depth.asks.first());
            println!("best bid: {:?}", depth.bids.first());
        }
        Err(err) => eprintln!("orderbook failed: {err}"),
    }
}
