use anyhow::Result;

// Print the OpenAPI spec so CI can publish it without starting the server
fn main() -> Result<()> {
    println!("{}", varco::api::openapi().to_pretty_json()?);

    Ok(())
}
